//! Static word-frequency index: normalized word -> frequency rank + CEFR band.
//!
//! Loaded once at process start and shared read-only behind an `Arc`; safe
//! for unsynchronized concurrent reads.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::constants::BEYOND_CORPUS_RANK;
use crate::types::{CefrBand, FrequencyEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyInfo {
    pub rank: u32,
    pub band: CefrBand,
}

#[derive(Debug)]
pub struct FrequencyIndex {
    by_word: HashMap<String, FrequencyInfo>,
}

impl FrequencyIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = FrequencyEntry>) -> Self {
        let mut by_word = HashMap::new();
        for entry in entries {
            let key = normalize(&entry.word);
            // First occurrence wins; corpora list words best-rank first.
            by_word.entry(key).or_insert(FrequencyInfo {
                rank: entry.rank,
                band: entry.band,
            });
        }
        Self { by_word }
    }

    /// Index over the embedded Spanish seed corpus.
    pub fn builtin_spanish() -> Arc<Self> {
        Arc::new(Self::from_entries(SPANISH_SEED.iter().cloned()))
    }

    /// Rank and band for `word`. Words beyond the corpus get a sentinel
    /// rank and the most advanced band.
    pub fn lookup(&self, word: &str) -> FrequencyInfo {
        self.by_word
            .get(&normalize(word))
            .copied()
            .unwrap_or(FrequencyInfo {
                rank: BEYOND_CORPUS_RANK,
                band: CefrBand::C2,
            })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.by_word.contains_key(&normalize(word))
    }

    pub fn len(&self) -> usize {
        self.by_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_word.is_empty()
    }
}

/// Lowercases and strips combining accents so "cómo" and "como" match the
/// same entry. The tilde on n is kept; ñ is a distinct letter in Spanish.
pub fn normalize(word: &str) -> String {
    word.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

/// Seed corpus: highest-frequency Spanish words in rank order. Deployments
/// with a full 10k corpus load it through [`FrequencyIndex::from_entries`].
static SPANISH_SEED: Lazy<Vec<FrequencyEntry>> = Lazy::new(|| {
    const WORDS: &[(&str, CefrBand)] = &[
        ("de", CefrBand::A1),
        ("la", CefrBand::A1),
        ("que", CefrBand::A1),
        ("el", CefrBand::A1),
        ("en", CefrBand::A1),
        ("y", CefrBand::A1),
        ("a", CefrBand::A1),
        ("los", CefrBand::A1),
        ("se", CefrBand::A1),
        ("del", CefrBand::A1),
        ("las", CefrBand::A1),
        ("un", CefrBand::A1),
        ("por", CefrBand::A1),
        ("con", CefrBand::A1),
        ("no", CefrBand::A1),
        ("una", CefrBand::A1),
        ("su", CefrBand::A1),
        ("para", CefrBand::A1),
        ("es", CefrBand::A1),
        ("al", CefrBand::A1),
        ("lo", CefrBand::A1),
        ("como", CefrBand::A1),
        ("mas", CefrBand::A1),
        ("o", CefrBand::A1),
        ("pero", CefrBand::A1),
        ("sus", CefrBand::A1),
        ("le", CefrBand::A1),
        ("ha", CefrBand::A1),
        ("me", CefrBand::A1),
        ("si", CefrBand::A1),
        ("sin", CefrBand::A1),
        ("sobre", CefrBand::A1),
        ("este", CefrBand::A1),
        ("ya", CefrBand::A1),
        ("entre", CefrBand::A1),
        ("cuando", CefrBand::A1),
        ("todo", CefrBand::A1),
        ("esta", CefrBand::A1),
        ("ser", CefrBand::A1),
        ("son", CefrBand::A1),
        ("dos", CefrBand::A1),
        ("tambien", CefrBand::A1),
        ("fue", CefrBand::A1),
        ("habia", CefrBand::A1),
        ("era", CefrBand::A1),
        ("muy", CefrBand::A1),
        ("hasta", CefrBand::A1),
        ("desde", CefrBand::A1),
        ("mi", CefrBand::A1),
        ("porque", CefrBand::A1),
        ("que", CefrBand::A1),
        ("solo", CefrBand::A1),
        ("han", CefrBand::A1),
        ("yo", CefrBand::A1),
        ("hay", CefrBand::A1),
        ("vez", CefrBand::A1),
        ("puede", CefrBand::A1),
        ("todos", CefrBand::A1),
        ("asi", CefrBand::A1),
        ("nos", CefrBand::A1),
        ("ni", CefrBand::A1),
        ("parte", CefrBand::A1),
        ("tiene", CefrBand::A1),
        ("uno", CefrBand::A1),
        ("donde", CefrBand::A1),
        ("bien", CefrBand::A1),
        ("tiempo", CefrBand::A1),
        ("mismo", CefrBand::A1),
        ("ese", CefrBand::A1),
        ("ahora", CefrBand::A1),
        ("cada", CefrBand::A1),
        ("e", CefrBand::A1),
        ("vida", CefrBand::A1),
        ("otro", CefrBand::A1),
        ("despues", CefrBand::A1),
        ("te", CefrBand::A1),
        ("otros", CefrBand::A1),
        ("aunque", CefrBand::A1),
        ("esa", CefrBand::A1),
        ("eso", CefrBand::A1),
        ("hace", CefrBand::A1),
        ("otra", CefrBand::A1),
        ("gobierno", CefrBand::A2),
        ("tan", CefrBand::A1),
        ("durante", CefrBand::A1),
        ("siempre", CefrBand::A1),
        ("dia", CefrBand::A1),
        ("tanto", CefrBand::A1),
        ("ella", CefrBand::A1),
        ("tres", CefrBand::A1),
        ("si", CefrBand::A1),
        ("dijo", CefrBand::A1),
        ("sido", CefrBand::A1),
        ("gran", CefrBand::A1),
        ("pais", CefrBand::A1),
        ("segun", CefrBand::A2),
        ("menos", CefrBand::A1),
        ("mundo", CefrBand::A1),
        ("año", CefrBand::A1),
        ("antes", CefrBand::A1),
        ("estado", CefrBand::A2),
        ("hola", CefrBand::A1),
        ("quiero", CefrBand::A1),
        ("casa", CefrBand::A1),
        ("hoy", CefrBand::A1),
        ("bueno", CefrBand::A1),
        ("gracias", CefrBand::A1),
        ("gusta", CefrBand::A1),
        ("mañana", CefrBand::A1),
        ("noche", CefrBand::A1),
        ("agua", CefrBand::A1),
        ("madre", CefrBand::A1),
        ("padre", CefrBand::A1),
        ("familia", CefrBand::A1),
        ("amigo", CefrBand::A1),
        ("trabajo", CefrBand::A1),
        ("escuela", CefrBand::A1),
        ("ciudad", CefrBand::A1),
        ("comida", CefrBand::A1),
        ("café", CefrBand::A1),
        ("semana", CefrBand::A1),
        ("mes", CefrBand::A1),
        ("hombre", CefrBand::A2),
        ("mujer", CefrBand::A2),
        ("niño", CefrBand::A2),
        ("momento", CefrBand::A2),
        ("forma", CefrBand::A2),
        ("caso", CefrBand::A2),
        ("nada", CefrBand::A2),
        ("hacer", CefrBand::A2),
        ("general", CefrBand::A2),
        ("estaba", CefrBand::A2),
        ("poco", CefrBand::A2),
        ("manera", CefrBand::A2),
        ("fueron", CefrBand::A2),
        ("mejor", CefrBand::A2),
        ("nuevo", CefrBand::A2),
        ("decir", CefrBand::A2),
        ("cualquier", CefrBand::A2),
        ("cuanto", CefrBand::A2),
        ("nacional", CefrBand::A2),
        ("cultura", CefrBand::A2),
        ("musica", CefrBand::A2),
        ("historia", CefrBand::A2),
        ("lugar", CefrBand::A2),
        ("persona", CefrBand::A2),
        ("empresa", CefrBand::B1),
        ("ejemplo", CefrBand::A2),
        ("mercado", CefrBand::B1),
        ("grupo", CefrBand::A2),
        ("sistema", CefrBand::B1),
        ("programa", CefrBand::B1),
        ("problema", CefrBand::A2),
        ("servicio", CefrBand::B1),
        ("proyecto", CefrBand::B1),
        ("desarrollo", CefrBand::B1),
        ("proceso", CefrBand::B1),
        ("sociedad", CefrBand::B1),
        ("politica", CefrBand::B1),
        ("economia", CefrBand::B1),
        ("tecnologia", CefrBand::B1),
        ("investigacion", CefrBand::B2),
        ("conocimiento", CefrBand::B2),
        ("comportamiento", CefrBand::B2),
        ("consecuencia", CefrBand::B2),
        ("crecimiento", CefrBand::B2),
        ("herramienta", CefrBand::B2),
        ("estrategia", CefrBand::B2),
        ("perspectiva", CefrBand::C1),
        ("incertidumbre", CefrBand::C1),
        ("sostenibilidad", CefrBand::C1),
        ("envergadura", CefrBand::C2),
        ("idiosincrasia", CefrBand::C2),
    ];

    WORDS
        .iter()
        .enumerate()
        .map(|(index, (word, band))| FrequencyEntry {
            word: (*word).to_string(),
            rank: index as u32 + 1,
            band: *band,
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_word() {
        let index = FrequencyIndex::builtin_spanish();
        let info = index.lookup("de");
        assert_eq!(info.rank, 1);
        assert_eq!(info.band, CefrBand::A1);
    }

    #[test]
    fn lookup_is_accent_insensitive() {
        let index = FrequencyIndex::builtin_spanish();
        assert_eq!(index.lookup("cómo"), index.lookup("como"));
        assert_eq!(index.lookup("CAFÉ"), index.lookup("cafe"));
    }

    #[test]
    fn absent_word_gets_sentinel() {
        let index = FrequencyIndex::builtin_spanish();
        let info = index.lookup("xilofonista");
        assert_eq!(info.rank, BEYOND_CORPUS_RANK);
        assert_eq!(info.band, CefrBand::C2);
    }

    #[test]
    fn duplicate_entries_keep_best_rank() {
        let entries = vec![
            FrequencyEntry {
                word: "sol".into(),
                rank: 10,
                band: CefrBand::A1,
            },
            FrequencyEntry {
                word: "sol".into(),
                rank: 500,
                band: CefrBand::B1,
            },
        ];
        let index = FrequencyIndex::from_entries(entries);
        assert_eq!(index.lookup("sol").rank, 10);
    }

    #[test]
    fn normalize_keeps_enye() {
        assert_eq!(normalize("AÑO"), "año");
        assert_eq!(normalize("está"), "esta");
    }
}
