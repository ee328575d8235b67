use rand::Rng;

/// One source token and its observed successors.
///
/// Edges keep first-seen order so a seeded RNG walks the graph the same way
/// on every run.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) token: String,
    edges: Vec<(String, u32)>,
    total: u32,
}

impl Node {
    pub(crate) fn new(token: String) -> Self {
        Self {
            token,
            edges: Vec::new(),
            total: 0,
        }
    }

    pub(crate) fn observe(&mut self, next: &str) {
        match self.edges.iter_mut().find(|(token, _)| token == next) {
            Some((_, count)) => *count += 1,
            None => self.edges.push((next.to_owned(), 1)),
        }
        self.total += 1;
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (&str, u32)> {
        self.edges.iter().map(|(token, count)| (token.as_str(), *count))
    }

    /// Successor drawn with probability proportional to its count. `None` without edges.
    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        if self.total == 0 {
            return None;
        }
        let draw = rng.random_range(0..self.total);
        let mut running = 0;
        for (token, count) in &self.edges {
            running += count;
            if running > draw {
                return Some(token.as_str());
            }
        }
        // counts always sum to total
        self.edges.last().map(|(token, _)| token.as_str())
    }
}
