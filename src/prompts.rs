//! Instruction templates for the generation client.
//!
//! The engines pass the working document separately as context; these
//! templates carry only the instruction side of a generation call.

/// Instruction for one expansion pass
pub fn expansion_instruction(current_words: usize, words_needed: usize) -> String {
    format!(
        "Expand the transcript supplied below into a more detailed and engaging \
narrative. The current word count is {current_words}; add approximately \
{words_needed} more words.

Requirements:
- Enrich existing paragraphs with specific details, names, dates and numbers
- Add relevant context and analysis
- Include personal stories and perspectives where appropriate
- Ensure smooth transitions between passages
- Single cohesive narrative, no section headers or formatting
- Written to be read aloud as video narration
- Return ONLY the new passages to append, with no comments or explanations"
    )
}

/// Instruction for folding one source excerpt into the research synthesis
pub fn research_instruction(topic: &str, domain: &str, excerpt: &str) -> String {
    format!(
        "The text supplied below is the research gathered so far on the topic \
\"{topic}\". Extract the information relevant to that topic from the following \
content retrieved from {domain}, and write it up as new research material.

Requirements:
- Include key dates, figures, statistics and events
- Analyze and extract the important information
- Note strategies, tactics and lessons learned
- Do not repeat material already covered by the existing research
- Be detailed and verbose, university essay style
- If the content holds nothing relevant, respond with NO_RELEVANT_INFO

Content:
{excerpt}"
    )
}

/// Marker the generator returns when a source held nothing relevant
pub const NO_RELEVANT_INFO: &str = "NO_RELEVANT_INFO";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_instruction_names_the_counts() {
        let instruction = expansion_instruction(420, 580);
        assert!(instruction.contains("current word count is 420"));
        assert!(instruction.contains("approximately 580 more words"));
    }

    #[test]
    fn test_research_instruction_names_topic_and_domain() {
        let instruction = research_instruction("Operation Overlord", "en.wikipedia.org", "page text");
        assert!(instruction.contains("\"Operation Overlord\""));
        assert!(instruction.contains("retrieved from en.wikipedia.org"));
        assert!(instruction.contains("page text"));
        assert!(instruction.contains(NO_RELEVANT_INFO));
    }
}
