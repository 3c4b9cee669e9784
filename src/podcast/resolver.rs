use super::models::{Persona, Segment};

const MAX_ROLE_CHARS: usize = 50;

/// Insertion-ordered role → voice lookup. Order matters: containment
/// matching takes the first entry that matches, and the first insertion of
/// a key wins for the lifetime of the parse.
struct VoiceMap {
    entries: Vec<(String, String)>,
}

impl VoiceMap {
    fn build(personas: &[Persona]) -> Self {
        let mut map = Self { entries: Vec::new() };
        for p in personas {
            map.insert(p.name.to_lowercase(), &p.voice);
            map.insert(p.voice.to_lowercase(), &p.voice);
        }
        // individual name words support partial addressing ("Dr. Chen" -> "chen")
        for p in personas {
            for word in p.name.to_lowercase().split_whitespace() {
                map.insert(word.to_string(), &p.voice);
            }
        }
        map
    }

    fn insert(&mut self, key: String, voice: &str) {
        if key.is_empty() || self.entries.iter().any(|(k, _)| *k == key) {
            return;
        }
        self.entries.push((key, voice.to_string()));
    }

    fn exact(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == role)
            .map(|(_, v)| v.as_str())
    }

    fn containment(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.contains(role) || role.contains(k.as_str()))
            .map(|(_, v)| v.as_str())
    }
}

/// Map raw `"Role: dialogue"` script lines to ordered segments with resolved
/// voices. Deterministic for a fixed (personas, lines) input: unrecognized
/// roles fall back to round-robin over the persona voices and keep their
/// first-seen binding for the rest of the parse.
pub fn resolve_segments(personas: &[Persona], lines: &[&str]) -> Vec<Segment> {
    if personas.is_empty() {
        return Vec::new();
    }

    let mut map = VoiceMap::build(personas);
    let default_voices: Vec<&str> = personas.iter().map(|p| p.voice.as_str()).collect();
    let mut cursor = 0usize;

    let mut segments = Vec::new();

    for raw in lines {
        let line = raw.trim();
        if line.starts_with("http") {
            continue;
        }
        let Some((role, text)) = line.split_once(':') else {
            continue;
        };
        let role = role.trim();
        let text = text.trim();
        if text.is_empty() || role.chars().count() >= MAX_ROLE_CHARS {
            continue;
        }

        let role_lower = role.to_lowercase();
        let voice = match map.exact(&role_lower).or_else(|| map.containment(&role_lower)) {
            Some(v) => v.to_string(),
            None => {
                let v = default_voices[cursor % default_voices.len()].to_string();
                cursor += 1;
                map.insert(role_lower, &v);
                v
            }
        };

        segments.push(Segment {
            role: role.to_string(),
            text: text.to_string(),
            voice,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personas() -> Vec<Persona> {
        vec![
            Persona { name: "Alice".into(), personality: "host".into(), voice: "V1".into() },
            Persona { name: "Bob".into(), personality: "guest".into(), voice: "V2".into() },
        ]
    }

    #[test]
    fn known_roles_resolve_to_their_voices() {
        let segments = resolve_segments(&personas(), &["Alice: hi", "Bob: hello"]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].voice, "V1");
        assert_eq!(segments[1].voice, "V2");
    }

    #[test]
    fn resolution_is_deterministic_and_memoizes_fallbacks() {
        let lines = ["Alice: hi", "Bob: hello", "Narrator: scene ends", "Narrator: again"];
        let first = resolve_segments(&personas(), &lines);
        let second = resolve_segments(&personas(), &lines);
        assert_eq!(first, second);
        // the unknown role keeps its first-seen binding
        assert_eq!(first[2].voice, first[3].voice);
    }

    #[test]
    fn fallback_round_robin_across_unknown_roles() {
        let lines = ["R1: a", "R2: b", "R3: c"];
        let segments = resolve_segments(&personas(), &lines);
        let voices: Vec<&str> = segments.iter().map(|s| s.voice.as_str()).collect();
        assert_eq!(voices, vec!["V1", "V2", "V1"]);
    }

    #[test]
    fn partial_name_addressing() {
        let personas = vec![Persona {
            name: "Dr. Chen".into(),
            personality: "expert".into(),
            voice: "V9".into(),
        }];
        let segments = resolve_segments(&personas, &["Chen: as I was saying"]);
        assert_eq!(segments[0].voice, "V9");
    }

    #[test]
    fn containment_matches_either_direction() {
        // "alice (laughing)" contains the lookup key "alice"
        let segments = resolve_segments(&personas(), &["Alice (laughing): ha"]);
        assert_eq!(segments[0].voice, "V1");
    }

    #[test]
    fn guard_lines_are_skipped() {
        let lines = [
            "no colon here",
            "http://example.com: not a role",
            "Alice:",
            "A role name that is far too long to plausibly be a speaker tag in any script at all: text",
            "Alice: kept",
        ];
        let segments = resolve_segments(&personas(), &lines);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "kept");
    }

    #[test]
    fn voice_identifier_is_addressable() {
        let segments = resolve_segments(&personas(), &["V2: spoken as the voice id"]);
        assert_eq!(segments[0].voice, "V2");
    }

    #[test]
    fn no_personas_yields_no_segments() {
        let segments = resolve_segments(&[], &["Alice: hi"]);
        assert!(segments.is_empty());
    }
}
