//! The translation prompt.

use std::collections::HashMap;

use crate::prompt::template::{ChatPromptTemplate, MessageTemplate};

/// Instruction that restricts the model to translating.
pub const SYSTEM_INSTRUCTION: &str = "你是一个只能翻译文本的翻译引擎，不需要进行解释。";

/// Per-request translation instruction.
pub const HUMAN_TEMPLATE: &str = "翻译这段文字到 {{.outputLang}}: {{.text}}";

pub const OUTPUT_LANG: &str = "outputLang";
pub const TEXT: &str = "text";

/// Build the two-message translation template.
pub fn translation_template() -> ChatPromptTemplate {
    ChatPromptTemplate::new(vec![
        MessageTemplate::system(SYSTEM_INSTRUCTION, &[]),
        MessageTemplate::human(HUMAN_TEMPLATE, &[OUTPUT_LANG, TEXT]),
    ])
}

/// Variable mapping for one translation request.
pub fn translation_variables(output_lang: &str, text: &str) -> HashMap<String, String> {
    HashMap::from([
        (OUTPUT_LANG.to_string(), output_lang.to_string()),
        (TEXT.to_string(), text.to_string()),
    ])
}
