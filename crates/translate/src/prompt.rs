use indoc::formatdoc;

pub(crate) fn text_instructions(target_language: &str) -> String {
    formatdoc! {"
        You are a professional translator. Your task is to translate text to {target_language}. Rules:
        1. Only output the translated text, nothing else
        2. Do not add explanations, notes, or commentary
        3. Preserve the original meaning and tone
        4. Keep formatting as close to the original as possible"}
}

pub(crate) fn text_request(target_language: &str, text: &str) -> String {
    format!("Translate this to {target_language}:\n\n{text}")
}

pub(crate) fn markup_instructions(target_language: &str) -> String {
    formatdoc! {r#"
        You are a professional translator. Your task is to translate HTML content to {target_language}.

        CRITICAL RULES:
        1. Maintain the EXACT HTML structure - do not add, remove, or modify any HTML tags, attributes, or classes
        2. Only translate the text content inside the tags
        3. Output ONLY the translated HTML - no explanations, no markdown code blocks, no additional text
        4. Preserve all whitespace and formatting exactly as in the original
        5. Do not translate HTML attributes or data attributes

        SPECIAL RULE FOR SENTENCE GROUPS:
        - When you see <div data-sentence-group="N">...</div>, this means ALL cues inside belong to ONE sentence
        - The text in these cues is fragmented (split across multiple subtitles)
        - You MUST translate them as ONE complete sentence
        - Then put the SAME complete translated sentence in EACH cue within that group

        Example with sentence groups:
        Input:
        <div data-sentence-group="0">
          <div data-cue-index="0">I love Tom and</div>
          <div data-cue-index="1">Lilly.</div>
        </div>
        <div data-sentence-group="1">
          <div data-cue-index="0">How are you?</div>
        </div>

        Output:
        <div data-sentence-group="0">
          <div data-cue-index="0">나는 Tom과 Lilly를 사랑합니다.</div>
          <div data-cue-index="1">나는 Tom과 Lilly를 사랑합니다.</div>
        </div>
        <div data-sentence-group="1">
          <div data-cue-index="0">어떻게 지내세요?</div>
        </div>

        Notice: Both cue-index 0 and 1 have the SAME complete translation because they are in the same sentence group."#}
}

pub(crate) fn markup_request(target_language: &str, markup: &str) -> String {
    format!(
        "Translate the following HTML to {target_language}. Remember: preserve the EXACT HTML structure, translate only text content:\n\n{markup}"
    )
}
