//! Event Resolution
//!
//! Turns a hierarchical event name into one concrete definition: exact
//! lookup first, then progressively more general names, then weighted
//! selection inside the matched variant group.

use std::sync::Arc;

use crate::bank::BankRegistry;
use crate::event::EventDefinition;
use crate::name::fallback_chain;
use crate::select::{SelectionRng, select_weighted};

/// A successful resolution
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// The name that matched (the request itself or a generalization)
    pub matched_name: &'a str,
    pub definition: Arc<EventDefinition>,
}

/// Name resolver with its own selection RNG
#[derive(Debug, Clone, Default)]
pub struct EventResolver {
    rng: SelectionRng,
}

impl EventResolver {
    /// Resolver seeded from OS entropy
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a reproducible selection sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SelectionRng::seeded(seed),
        }
    }

    /// Restart the selection sequence from a seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SelectionRng::seeded(seed);
    }

    /// Resolve a name against the mounted banks
    pub fn resolve(&mut self, registry: &BankRegistry, event_name: &str) -> Option<Arc<EventDefinition>> {
        self.resolve_detailed(registry, event_name)
            .map(|resolved| resolved.definition)
    }

    /// Like [`resolve`](Self::resolve), also reporting which name matched
    pub fn resolve_detailed<'a>(
        &mut self,
        registry: &BankRegistry,
        event_name: &'a str,
    ) -> Option<Resolved<'a>> {
        for candidate in fallback_chain(event_name) {
            let variants = registry.variants(candidate);
            if variants.is_empty() {
                continue;
            }

            let definition = match variants {
                [single] => Arc::clone(single),
                group => {
                    let rng = &mut self.rng;
                    let chosen = select_weighted(group, |d| d.selection_weight(), &mut || rng.roll())?;
                    Arc::clone(chosen)
                }
            };

            return Some(Resolved {
                matched_name: candidate,
                definition,
            });
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBank;

    fn registry(events: Vec<EventDefinition>) -> BankRegistry {
        let mut registry = BankRegistry::new();
        registry.load_bank(EventBank {
            name: "Test".into(),
            events,
        });
        registry
    }

    #[test]
    fn test_exact_match() {
        let registry = registry(vec![
            EventDefinition::new("GRAVEL:FOOTSTEP").with_clip("gravel.wav"),
            EventDefinition::new("FOOTSTEP").with_clip("step.wav"),
        ]);
        let mut resolver = EventResolver::with_seed(1);

        let resolved = resolver.resolve_detailed(&registry, "GRAVEL:FOOTSTEP").unwrap();
        assert_eq!(resolved.matched_name, "GRAVEL:FOOTSTEP");
        assert_eq!(resolved.definition.event_name, "GRAVEL:FOOTSTEP");
    }

    #[test]
    fn test_fallback_to_general() {
        let registry = registry(vec![EventDefinition::new("FOOTSTEP").with_clip("step.wav")]);
        let mut resolver = EventResolver::with_seed(1);

        let resolved = resolver.resolve_detailed(&registry, "WOLF:GRAVEL:FOOTSTEP").unwrap();
        assert_eq!(resolved.matched_name, "FOOTSTEP");
        assert_eq!(resolved.definition.event_name, "FOOTSTEP");
    }

    #[test]
    fn test_fallback_stops_at_most_specific_match() {
        let registry = registry(vec![
            EventDefinition::new("GRAVEL:FOOTSTEP"),
            EventDefinition::new("FOOTSTEP"),
        ]);
        let mut resolver = EventResolver::with_seed(1);

        let resolved = resolver.resolve_detailed(&registry, "WOLF:GRAVEL:FOOTSTEP").unwrap();
        assert_eq!(resolved.matched_name, "GRAVEL:FOOTSTEP");
    }

    #[test]
    fn test_fallback_exhausted() {
        let registry = registry(vec![EventDefinition::new("FOOTSTEP")]);
        let mut resolver = EventResolver::with_seed(1);

        assert!(resolver.resolve(&registry, "FOOTSTEP:WOLF").is_none());
        assert!(resolver.resolve(&registry, "FOOTSTEP:").is_none());
        assert!(resolver.resolve(&registry, "STEP").is_none());
        assert!(resolver.resolve(&registry, "").is_none());
    }

    #[test]
    fn test_single_variant_always_returned() {
        let registry = registry(vec![EventDefinition::new("ONLY").with_weight(0.0)]);
        let mut resolver = EventResolver::new();
        let expected = Arc::clone(&registry.variants("ONLY")[0]);

        for _ in 0..50 {
            let got = resolver.resolve(&registry, "ONLY").unwrap();
            assert!(Arc::ptr_eq(&got, &expected));
        }
    }

    #[test]
    fn test_weighted_zero_zero_one() {
        let registry = registry(vec![
            EventDefinition::new("PICK").with_clip("a").with_weight(0.0),
            EventDefinition::new("PICK").with_clip("b").with_weight(0.0),
            EventDefinition::new("PICK").with_clip("c").with_weight(1.0),
        ]);
        let mut resolver = EventResolver::with_seed(99);

        for _ in 0..200 {
            let got = resolver.resolve(&registry, "PICK").unwrap();
            assert_eq!(got.clip.as_ref().map(|c| c.as_str()), Some("c"));
        }
    }

    #[test]
    fn test_all_zero_weights_pick_first() {
        let registry = registry(vec![
            EventDefinition::new("PICK").with_clip("a").with_weight(0.0),
            EventDefinition::new("PICK").with_clip("b").with_weight(0.0),
        ]);
        let mut resolver = EventResolver::with_seed(3);

        let got = resolver.resolve(&registry, "PICK").unwrap();
        assert_eq!(got.clip.as_ref().map(|c| c.as_str()), Some("a"));
    }

    #[test]
    fn test_seeded_sequence_reproducible() {
        let registry = registry(vec![
            EventDefinition::new("HIT").with_clip("a"),
            EventDefinition::new("HIT").with_clip("b"),
            EventDefinition::new("HIT").with_clip("c"),
        ]);

        let draw = |resolver: &mut EventResolver| -> Vec<String> {
            (0..64)
                .filter_map(|_| resolver.resolve(&registry, "HIT"))
                .filter_map(|d| d.clip.as_ref().map(|c| c.as_str().to_string()))
                .collect()
        };

        let mut a = EventResolver::with_seed(7);
        let mut b = EventResolver::with_seed(7);
        let first = draw(&mut a);
        assert_eq!(first, draw(&mut b));

        a.reseed(7);
        assert_eq!(first, draw(&mut a));
    }
}
