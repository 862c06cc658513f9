//! Prompt engineering for entity extraction

use crate::config::Aggressiveness;

/// Maximum known names included as dedup context
const KNOWN_NAMES_LIMIT: usize = 25;

/// Builds the extraction prompt for one chunk
pub struct PromptBuilder {
    chunk: String,
    language: String,
    aggressiveness: Aggressiveness,
    known_names: Vec<String>,
    include_relationships: bool,
}

impl PromptBuilder {
    /// Create a new prompt builder for a chunk of source text
    pub fn new(chunk: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            language: language.into(),
            aggressiveness: Aggressiveness::default(),
            known_names: Vec::new(),
            include_relationships: true,
        }
    }

    /// Select the extraction mode
    pub fn with_aggressiveness(mut self, aggressiveness: Aggressiveness) -> Self {
        self.aggressiveness = aggressiveness;
        self
    }

    /// Add names already present in the campaign as dedup hints
    pub fn with_known_names(mut self, names: Vec<String>) -> Self {
        self.known_names = names;
        self
    }

    /// Whether the prompt asks for relationships at all
    pub fn with_relationships(mut self, include: bool) -> Self {
        self.include_relationships = include;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Mode-specific instruction block
        prompt.push_str(match self.aggressiveness {
            Aggressiveness::Conservative => CONSERVATIVE_INSTRUCTIONS,
            Aggressiveness::Balanced => BALANCED_INSTRUCTIONS,
            Aggressiveness::Obsessive => OBSESSIVE_INSTRUCTIONS,
        });
        prompt.push_str("\n\n");

        // 2. Shared extraction rules
        prompt.push_str(EXTRACTION_RULES);
        prompt.push_str("\n\n");

        if !self.include_relationships {
            prompt.push_str("Do not extract relationships; return an empty relationships array.\n\n");
        }

        // 3. Language for generated descriptions
        prompt.push_str(&format!("Write all descriptions in {}.\n\n", self.language));

        // 4. Deduplication hints (if any)
        if !self.known_names.is_empty() {
            prompt.push_str("Entries that already exist in this campaign (do NOT extract these as new entities):\n");
            for name in self.known_names.iter().take(KNOWN_NAMES_LIMIT) {
                prompt.push_str(&format!("- {}\n", name));
            }
            prompt.push('\n');
        }

        // 5. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.chunk);
        prompt.push_str("\n---\n\n");

        // 6. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

const CONSERVATIVE_INSTRUCTIONS: &str = r#"You are building a campaign wiki from session notes and lore documents.
Extract ONLY the clearly significant entities: named characters with an active
role, major locations, factions that drive events. Skip one-off mentions,
background color, and anything you are not confident about."#;

const BALANCED_INSTRUCTIONS: &str = r#"You are building a campaign wiki from session notes and lore documents.
Extract the entities that matter to the narrative: named people, places,
items, factions, creatures, and events a reader would want a wiki page for.
Skip throwaway background detail."#;

const OBSESSIVE_INSTRUCTIONS: &str = r#"You are building a campaign wiki from session notes and lore documents.
Extract EVERY named thing, however incidental: people, places, items,
factions, creatures, events, deities, ships, shops, spells, festivals.
When in doubt, extract it with a lower confidence."#;

const EXTRACTION_RULES: &str = r#"Rules:
- Entity types are free-form lowercase tags ("person", "place", "item",
  "faction", ...). Invent a new type when nothing fits.
- List aliases: titles, nicknames, and shortened forms used in the text.
- The description summarizes what THIS text says about the entity, in plain
  prose. Mention other entities by their exact names so they can be linked.
- confidence is a number between 0.0 and 1.0: how sure you are this is a
  real, distinct entity worth a wiki page.
- Relationships connect two extracted entity names with a short lowercase
  type ("ally of", "located in", "leads"). Add reverse_label when the
  backward direction reads differently ("led by"). Quote the supporting
  text in excerpt."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (a single JSON object, no additional text):
{
  "entities": [
    {
      "name": "Grok the Bold",
      "type": "person",
      "aliases": ["Grok"],
      "description": "Warchief of the Ashen Court...",
      "confidence": 0.9
    }
  ],
  "relationships": [
    {
      "source": "Grok the Bold",
      "target": "Ashen Court",
      "type": "leads",
      "reverse_label": "led by",
      "excerpt": "Grok has led the Ashen Court since the Red Winter."
    }
  ]
}

Remember: return ONLY valid JSON, no markdown code blocks, no explanations."#;
