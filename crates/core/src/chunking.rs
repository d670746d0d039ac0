use crate::config::PipelineConfig;
use crate::error::IngestError;

/// Break points in order of preference. Separators on the same level compete
/// on position only.
const BOUNDARY_LEVELS: [&[&str]; 4] = [&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(PipelineConfig::default())
    }
}

impl From<PipelineConfig> for ChunkingConfig {
    fn from(value: PipelineConfig) -> Self {
        Self {
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters where each
/// chunk repeats the last `chunk_overlap` characters of its predecessor.
///
/// Cuts land after the most preferred boundary that still leaves the chunk at
/// least half full, falling back to a hard cut at `chunk_size`.
pub fn split_text(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    if chars.is_empty() {
        return Ok(chunks);
    }

    let levels: Vec<Vec<Vec<char>>> = BOUNDARY_LEVELS
        .iter()
        .map(|level| level.iter().map(|sep| sep.chars().collect()).collect())
        .collect();

    let mut start = 0;
    loop {
        if chars.len() - start <= config.chunk_size {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let limit = start + config.chunk_size;
        let min_cut = (start + config.chunk_size / 2).max(start + config.chunk_overlap + 1);
        let cut = preferred_cut(&chars, &levels, min_cut, limit).unwrap_or(limit);

        chunks.push(chars[start..cut].iter().collect());
        start = cut - config.chunk_overlap;
    }

    Ok(chunks)
}

fn preferred_cut(
    chars: &[char],
    levels: &[Vec<Vec<char>>],
    min_cut: usize,
    limit: usize,
) -> Option<usize> {
    levels.iter().find_map(|separators| {
        separators
            .iter()
            .filter_map(|separator| last_cut(chars, separator, min_cut, limit))
            .max()
    })
}

/// Largest `cut` in `[min_cut, limit]` such that `chars[..cut]` ends with `separator`.
fn last_cut(chars: &[char], separator: &[char], min_cut: usize, limit: usize) -> Option<usize> {
    let len = separator.len();
    let mut cut = limit;
    while cut >= min_cut && cut >= len {
        if chars[cut - len..cut] == *separator {
            return Some(cut);
        }
        cut -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut text = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            if index == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(overlap));
            }
        }
        text
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for paragraph in 0..12 {
            for sentence in 0..9 {
                text.push_str(&format!(
                    "Paragraph {paragraph} sentence {sentence} talks about pumps, valves and flow. "
                ));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text("", ChunkingConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_text("Paris is the capital of France.", ChunkingConfig::default()).unwrap();
        assert_eq!(chunks, vec!["Paris is the capital of France.".to_string()]);
    }

    #[test]
    fn chunks_never_exceed_max_size() {
        let text = sample_text();
        let chunks = split_text(&text, ChunkingConfig::default()).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 1_000));
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
    }

    #[test]
    fn dropping_overlap_reconstructs_text() {
        let text = sample_text();
        for (size, overlap) in [(1_000, 20), (120, 30), (57, 0)] {
            let chunks = split_text(&text, config(size, overlap)).unwrap();
            assert_eq!(reconstruct(&chunks, overlap), text, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let text = sample_text();
        let chunks = split_text(&text, config(200, 20)).unwrap();
        for pair in chunks.windows(2) {
            let tail: String = {
                let chars: Vec<char> = pair[0].chars().collect();
                chars[chars.len() - 20..].iter().collect()
            };
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn paragraph_break_is_preferred() {
        let text = format!("{}\n\n{}", "a".repeat(600), "b".repeat(600));
        let chunks = split_text(&text, ChunkingConfig::default()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(chunks[0].chars().count(), 602);
    }

    #[test]
    fn sentence_break_beats_word_break() {
        let text = format!("{}. {} {}", "a".repeat(70), "b".repeat(20), "c".repeat(40));
        let chunks = split_text(&text, config(100, 5)).unwrap();
        assert!(chunks[0].ends_with(". "), "first chunk: {:?}", chunks[0]);
    }

    #[test]
    fn text_without_boundaries_is_hard_cut() {
        let text = "x".repeat(2_500);
        let chunks = split_text(&text, ChunkingConfig::default()).unwrap();
        let sizes = chunks.iter().map(|chunk| chunk.len()).collect::<Vec<_>>();
        assert_eq!(sizes, vec![1_000, 1_000, 540]);
    }

    #[test]
    fn multibyte_text_is_split_on_characters() {
        let text = "é".repeat(250);
        let chunks = split_text(&text, config(100, 10)).unwrap();
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 100));
        assert_eq!(reconstruct(&chunks, 10), text);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            split_text("abc", config(10, 10)),
            Err(IngestError::InvalidChunkConfig(_))
        ));
        assert!(matches!(
            split_text("abc", config(0, 0)),
            Err(IngestError::InvalidChunkConfig(_))
        ));
    }
}
