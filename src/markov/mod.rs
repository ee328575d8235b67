//! Word-level Markov chain text generator.
//!
//! A [`Markov`] is built fresh from a tenant's corpus for each reply and
//! thrown away afterwards. Tokens are whitespace-separated words, lower-cased
//! on the way in; transitions never cross fragment boundaries.
//!
//! Generation is a bounded random walk: start at a uniformly chosen token,
//! follow weighted successors until the text reaches a randomly drawn
//! character length or the walk hits a token with no successors.

mod node;

use std::collections::HashMap;

use rand::Rng;

use crate::corpus::types::GenMode;
use node::Node;

/// Upper bound on generated text length, in characters, when the caller has no preference.
pub const DEFAULT_MAX_LENGTH: usize = 70;

#[derive(Debug, Clone, Default)]
pub struct Markov {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Markov {
    /// Build the transition graph from a corpus, one fragment at a time.
    ///
    /// A fragment holding a single token records a self edge, so a corpus of
    /// one-word messages can still produce output.
    pub fn build<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markov = Self::default();
        for fragment in fragments {
            markov.add(fragment.as_ref());
        }
        markov
    }

    /// Build from a single block of text.
    ///
    /// Only for text that really is one continuous passage. A stored corpus
    /// goes through [`Self::build`] so the last word of one message is never
    /// chained to the first word of the next.
    pub fn from_text(text: &str) -> Self {
        Self::build([text])
    }

    fn add(&mut self, fragment: &str) {
        let tokens: Vec<String> = fragment.split_whitespace().map(str::to_lowercase).collect();
        match tokens.as_slice() {
            [] => {}
            [only] => self.observe(only, only),
            _ => {
                for pair in tokens.windows(2) {
                    self.observe(&pair[0], &pair[1]);
                }
            }
        }
    }

    fn observe(&mut self, from: &str, to: &str) {
        let slot = match self.index.get(from) {
            Some(&slot) => slot,
            None => {
                self.nodes.push(Node::new(from.to_owned()));
                self.index.insert(from.to_owned(), self.nodes.len() - 1);
                self.nodes.len() - 1
            }
        };
        self.nodes[slot].observe(to);
    }

    fn node(&self, token: &str) -> Option<&Node> {
        self.index.get(token).map(|&slot| &self.nodes[slot])
    }

    /// Number of distinct source tokens.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Successors of `token` with their observation counts, in first-seen order.
    pub fn successors(&self, token: &str) -> Vec<(String, u32)> {
        self.node(token)
            .map(|node| node.edges().map(|(t, c)| (t.to_owned(), c)).collect())
            .unwrap_or_default()
    }

    /// Lower-case output. `None` when the graph is empty.
    pub fn generate_low(&self, max_length: usize) -> Option<String> {
        self.generate_low_with_rng(max_length, &mut rand::rng())
    }

    /// Output with sentence starts capitalised. `None` when the graph is empty.
    pub fn generate_high(&self, max_length: usize) -> Option<String> {
        self.generate_high_with_rng(max_length, &mut rand::rng())
    }

    pub fn generate_low_with_rng<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Option<String> {
        self.walk(max_length, rng)
            .map(|text| fix_capitals(&text).to_lowercase())
    }

    pub fn generate_high_with_rng<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Option<String> {
        self.walk(max_length, rng).map(|text| fix_capitals(&text))
    }

    /// Dispatch on a tenant's generation mode.
    pub fn generate(&self, mode: GenMode, max_length: usize) -> Option<String> {
        match mode {
            GenMode::Default => self.generate_low(max_length),
            GenMode::Literate => self.generate_high(max_length),
        }
    }

    fn walk<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Option<String> {
        if self.nodes.is_empty() {
            return None;
        }
        let start = &self.nodes[rng.random_range(0..self.nodes.len())];
        let target = rng.random_range(1..=max_length.max(1));

        let mut text = start.token.clone();
        let Some(mut next) = start.sample(rng) else {
            return Some(text);
        };
        if next == start.token {
            return Some(text);
        }

        let mut len = text.chars().count();
        while len < target {
            text.push(' ');
            text.push_str(next);
            len += 1 + next.chars().count();

            match self.node(next).and_then(|node| node.sample(rng)) {
                Some(token) => next = token,
                None => break,
            }
        }
        tracing::trace!(target_len = target, len, "markov walk");
        Some(text)
    }
}

/// Upper-case the first character after each sentence terminator, and at the start.
///
/// Terminators are handled one after another: `". "`, `"? "`, `"! "`, `"... "`.
pub fn fix_capitals(text: &str) -> String {
    [". ", "? ", "! ", "... "]
        .iter()
        .fold(text.to_owned(), |acc, terminator| {
            acc.split(terminator)
                .map(capitalize_first)
                .collect::<Vec<_>>()
                .join(terminator)
        })
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_valid_walk(markov: &Markov, text: &str) -> bool {
        let tokens: Vec<&str> = text.split(' ').collect();
        tokens.windows(2).all(|pair| {
            markov
                .successors(pair[0])
                .iter()
                .any(|(next, _)| next == pair[1])
        })
    }

    #[test]
    fn build_counts_transitions_per_fragment() {
        let markov = Markov::build(["the cat sat", "the dog ran"]);
        assert_eq!(markov.node_count(), 3);
        assert_eq!(
            markov.successors("the"),
            vec![("cat".to_string(), 1), ("dog".to_string(), 1)]
        );
        assert!(markov.successors("sat").is_empty());
        // no edge across fragments
        assert!(markov.successors("ran").is_empty());
    }

    #[test]
    fn build_lowercases_tokens() {
        let markov = Markov::build(["Hello World", "hello there"]);
        assert_eq!(
            markov.successors("hello"),
            vec![("world".to_string(), 1), ("there".to_string(), 1)]
        );
        assert!(markov.successors("Hello").is_empty());
    }

    #[test]
    fn empty_corpus_generates_nothing() {
        let markov = Markov::build(Vec::<String>::new());
        assert!(markov.is_empty());
        assert_eq!(markov.generate_low(DEFAULT_MAX_LENGTH), None);
        assert_eq!(markov.generate_high(DEFAULT_MAX_LENGTH), None);

        let blank = Markov::build(["", "   "]);
        assert!(blank.is_empty());
        assert_eq!(blank.generate_low(10), None);
    }

    #[test]
    fn single_token_is_deterministic() {
        let markov = Markov::build(["hello"]);
        assert_eq!(markov.successors("hello"), vec![("hello".to_string(), 1)]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(markov.generate_low_with_rng(70, &mut rng).as_deref(), Some("hello"));
            assert_eq!(markov.generate_high_with_rng(70, &mut rng).as_deref(), Some("Hello"));
        }
    }

    #[test]
    fn output_is_a_walk_over_source_tokens() {
        let markov = Markov::build(["the cat sat", "the dog ran"]);
        let vocabulary = ["the", "cat", "sat", "dog", "ran"];
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = markov.generate_low_with_rng(DEFAULT_MAX_LENGTH, &mut rng).unwrap();
            assert!(!text.is_empty());
            assert!(text.split(' ').all(|t| vocabulary.contains(&t)), "{text}");
            assert!(is_valid_walk(&markov, &text), "{text}");
        }
    }

    #[test]
    fn walk_stops_near_target_length() {
        let markov = Markov::build(["a b c d e f g h i j k l m n o p q r s t"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = markov.generate_low_with_rng(12, &mut rng).unwrap();
            // at most one token past the target
            assert!(text.chars().count() <= 12 + 2, "{text}");
        }
    }

    #[test]
    fn zero_max_length_still_emits_one_step() {
        let markov = Markov::build(["one two three"]);
        let mut rng = StdRng::seed_from_u64(3);
        let text = markov.generate_low_with_rng(0, &mut rng).unwrap();
        assert!(!text.is_empty());
    }

    #[test]
    fn low_is_lower_case_and_high_is_capitalised() {
        let markov = Markov::build(["good morning. how are you? fine! thanks"]);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let low = markov.generate_low_with_rng(DEFAULT_MAX_LENGTH, &mut rng).unwrap();
            assert_eq!(low, low.to_lowercase());

            let mut rng = StdRng::seed_from_u64(seed);
            let high = markov.generate_high_with_rng(DEFAULT_MAX_LENGTH, &mut rng).unwrap();
            assert!(high.chars().next().unwrap().is_uppercase(), "{high}");
            assert_eq!(high.to_lowercase(), low);
        }
    }

    #[test]
    fn generate_dispatches_on_mode() {
        let markov = Markov::build(["hello"]);
        assert_eq!(markov.generate(GenMode::Default, 10).as_deref(), Some("hello"));
        assert_eq!(markov.generate(GenMode::Literate, 10).as_deref(), Some("Hello"));
    }

    #[test]
    fn fix_capitals_repairs_sentence_starts() {
        assert_eq!(fix_capitals("hello. world"), "Hello. World");
        assert_eq!(fix_capitals("why? because! ok... then"), "Why? Because! Ok... Then");
        assert_eq!(fix_capitals("ünïcode. éclair"), "Ünïcode. Éclair");
        assert_eq!(fix_capitals(""), "");
        assert_eq!(fix_capitals("no terminator here"), "No terminator here");
    }

    #[test]
    fn from_text_matches_single_fragment() {
        let markov = Markov::from_text("a b a c");
        assert_eq!(
            markov.successors("a"),
            vec![("b".to_string(), 1), ("c".to_string(), 1)]
        );
        assert_eq!(markov.successors("b"), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn fragments_are_not_chained_across_messages() {
        let per_message = Markov::build(["good night", "morning all"]);
        assert!(per_message.successors("night").is_empty());

        let joined = Markov::from_text("good night morning all");
        assert_eq!(joined.successors("night"), vec![("morning".to_string(), 1)]);
    }
}
