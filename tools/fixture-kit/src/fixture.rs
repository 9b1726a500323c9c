/// One recorded input and the output lines expected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub input: String,
    pub output: Vec<String>,
}

impl Fixture {
    pub fn new(input: impl Into<String>, output: Vec<String>) -> Self {
        Self {
            input: input.into(),
            output,
        }
    }
}

/// Ordered fixtures. Only ever appended to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixtureCollection {
    fixtures: Vec<Fixture>,
}

impl FixtureCollection {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self { fixtures }
    }

    pub fn push(&mut self, fixture: Fixture) -> usize {
        self.fixtures.push(fixture);
        self.fixtures.len() - 1
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[Fixture] {
        &self.fixtures
    }
}

impl<'a> IntoIterator for &'a FixtureCollection {
    type Item = &'a Fixture;
    type IntoIter = std::slice::Iter<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_and_returns_index() {
        let mut collection = FixtureCollection::default();
        assert!(collection.is_empty());
        assert_eq!(collection.push(Fixture::new("a", vec!["1".to_string()])), 0);
        assert_eq!(collection.push(Fixture::new("b", Vec::new())), 1);
        let inputs = collection
            .iter()
            .map(|fixture| fixture.input.as_str())
            .collect::<Vec<_>>();
        assert_eq!(inputs, vec!["a", "b"]);
    }
}
