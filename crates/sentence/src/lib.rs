//! Reassembles caption fragments into whole sentences.
//!
//! Host pages split speech into short cues that often stop mid-sentence
//! ("I love Tom and" / "Lilly."). Translating those pieces one by one gives
//! poor results, so consecutive fragments are merged whenever the earlier one
//! is plainly unfinished or the later one plainly continues it.

mod heuristics;

pub use heuristics::*;

/// A run of consecutive cues whose texts form one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGroup<C> {
    pub cues: Vec<C>,
    pub text: String,
}

/// Groups `cues` into sentences using `text_of` to read each cue.
///
/// Cues whose text is empty or whitespace belong to no group. Every other cue
/// belongs to exactly one group, and groups keep document order.
pub fn group_by_sentence<C, F>(cues: &[C], text_of: F) -> Vec<SentenceGroup<C>>
where
    C: Clone,
    F: Fn(&C) -> String,
{
    let mut groups: Vec<SentenceGroup<C>> = Vec::new();
    let mut segments: Vec<String> = Vec::new();
    let mut previous: Option<String> = None;

    for cue in cues {
        let text = text_of(cue);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        let continues = previous
            .as_deref()
            .is_some_and(|prev| is_continuation(prev, trimmed));

        match groups.last_mut() {
            Some(group) if continues => {
                group.cues.push(cue.clone());
                segments.push(trimmed.to_string());
            }
            _ => {
                if let Some(group) = groups.last_mut() {
                    group.text = join_segments(&segments);
                }
                segments.clear();
                segments.push(trimmed.to_string());
                groups.push(SentenceGroup {
                    cues: vec![cue.clone()],
                    text: String::new(),
                });
            }
        }

        previous = Some(trimmed.to_string());
    }

    if let Some(group) = groups.last_mut() {
        group.text = join_segments(&segments);
    }

    groups
}

/// Merges plain fragments; each group's cues are indices into `fragments`.
pub fn merge_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<SentenceGroup<usize>> {
    let indices: Vec<usize> = (0..fragments.len()).collect();
    group_by_sentence(&indices, |i| fragments[*i].as_ref().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(groups: &[SentenceGroup<usize>]) -> Vec<&str> {
        groups.iter().map(|g| g.text.as_str()).collect()
    }

    #[test]
    fn test_stop_word_joins_next_fragment() {
        let groups = merge_fragments(&["I love Tom and", "Lilly."]);
        assert_eq!(texts(&groups), vec!["I love Tom and Lilly."]);
        assert_eq!(groups[0].cues, vec![0, 1]);
    }

    #[test]
    fn test_single_complete_fragment() {
        let groups = merge_fragments(&["How are you?"]);
        assert_eq!(texts(&groups), vec!["How are you?"]);
    }

    #[test]
    fn test_two_full_sentences_stay_apart() {
        let groups = merge_fragments(&["Hello there.", "How are you?"]);
        assert_eq!(texts(&groups), vec!["Hello there.", "How are you?"]);
    }

    #[test]
    fn test_lowercase_start_continues() {
        let groups = merge_fragments(&["So we open the file", "and then we read it.", "Next."]);
        assert_eq!(
            texts(&groups),
            vec!["So we open the file and then we read it.", "Next."]
        );
    }

    #[test]
    fn test_trailing_comma_continues() {
        let groups = merge_fragments(&["First of all,", "We install Rust."]);
        assert_eq!(texts(&groups), vec!["First of all, We install Rust."]);
    }

    #[test]
    fn test_empty_fragments_are_dropped() {
        let groups = merge_fragments(&["  ", "I love Tom and", "", "Lilly.", "\n"]);
        assert_eq!(texts(&groups), vec!["I love Tom and Lilly."]);
        assert_eq!(groups[0].cues, vec![1, 3]);

        assert!(merge_fragments(&["", "   "]).is_empty());
        assert!(merge_fragments::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_terminator_wins_over_stop_word() {
        let groups = merge_fragments(&["We stop at the.", "Then continue."]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_cjk_terminators() {
        let groups = merge_fragments(&["今日は。", "Rust を学びます！"]);
        assert_eq!(groups.len(), 2);
    }

    #[quickcheck_macros::quickcheck]
    fn prop_groups_partition_non_empty_fragments(fragments: Vec<String>) -> bool {
        let groups = merge_fragments(&fragments);

        let covered: Vec<usize> = groups.iter().flat_map(|g| g.cues.clone()).collect();
        let expected: Vec<usize> = fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        let texts_match = groups.iter().all(|g| {
            !g.cues.is_empty()
                && g.text
                    == join_segments(
                        &g.cues
                            .iter()
                            .map(|i| fragments[*i].trim().to_string())
                            .collect::<Vec<_>>(),
                    )
        });

        covered == expected && texts_match
    }

    #[quickcheck_macros::quickcheck]
    fn prop_merging_is_idempotent(fragments: Vec<String>) -> bool {
        let once = merge_fragments(&fragments);
        let again = merge_fragments(&once.iter().map(|g| g.text.clone()).collect::<Vec<_>>());

        merge_fragments(&fragments) == once
            && again.len() == once.len()
            && again.iter().zip(&once).all(|(a, b)| a.text == b.text)
    }
}
