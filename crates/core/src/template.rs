//! Prompt templates.
//!
//! Templates are static data: a title plus a pure render function. Group templates also carry
//! a fixed list of options (target language, tone) and take the chosen option's value as a
//! second argument.

use std::fmt;

/// Appended to every rendered prompt so the model answers with the text alone.
pub const OUTPUT_ONLY_SUFFIX: &str =
    "Output only the generated text, without any explanation, preamble or surrounding quotes.";

/// One selectable option of a group template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOption {
    pub title: &'static str,
    pub value: &'static str,
}

const fn option(title: &'static str, value: &'static str) -> TemplateOption {
    TemplateOption { title, value }
}

/// A prompt template
#[derive(Clone, Copy)]
pub enum Template {
    /// A single action rendered from the input alone
    Single { title: &'static str, render: fn(&str) -> String },
    /// An action parameterized by one of `options`
    Group { title: &'static str, render: fn(&str, &str) -> String, options: &'static [TemplateOption] },
}

impl Template {
    pub fn title(&self) -> &'static str {
        match self {
            Template::Single { title, .. } | Template::Group { title, .. } => *title,
        }
    }

    /// Options of a group template; empty for single templates
    pub fn options(&self) -> &'static [TemplateOption] {
        match self {
            Template::Single { .. } => &[],
            Template::Group { options, .. } => *options,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Template::Group { .. })
    }

    /// First option, used until the user picks one
    pub fn default_option(&self) -> Option<&'static TemplateOption> {
        self.options().first()
    }

    pub fn find_option(&self, value: &str) -> Option<&'static TemplateOption> {
        self.options().iter().find(|o| o.value == value)
    }

    /// Render the prompt body. Single templates ignore `option`; group templates fall back
    /// to their first option when none is given and pass unknown values through verbatim.
    pub fn render(&self, input: &str, option: Option<&str>) -> String {
        match self {
            Template::Single { render, .. } => render(input),
            Template::Group { render, options, .. } => {
                let value = option.or_else(|| options.first().map(|o| o.value)).unwrap_or_default();
                render(input, value)
            }
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Single { title, .. } => f.debug_struct("Single").field("title", title).finish(),
            Template::Group { title, options, .. } => f
                .debug_struct("Group")
                .field("title", title)
                .field("options", &options.len())
                .finish(),
        }
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.title() == other.title()
    }
}

/// Full prompt sent to the model: the rendered template, a newline and the output-only
/// instruction.
pub fn build_prompt(template: &Template, input: &str, option: Option<&str>) -> String {
    format!("{}\n{}", template.render(input, option), OUTPUT_ONLY_SUFFIX)
}

/// All templates, in display order
pub fn templates() -> &'static [Template] {
    TEMPLATES
}

/// Look up a template by title, ignoring case
pub fn find(title: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.title().eq_ignore_ascii_case(title))
}

static TEMPLATES: &[Template] = &[
    Template::Group { title: "Change tone", render: change_tone, options: TONES },
    Template::Single { title: "Summarize", render: summarize },
    Template::Single { title: "Brainstorm ideas", render: brainstorm },
    Template::Single { title: "Fix spelling & grammar", render: fix_errors },
    Template::Single { title: "Compose a reply", render: compose_reply },
    Template::Single { title: "Explain", render: explain },
    Template::Single { title: "Improve copywriting", render: copywriting },
    Template::Group { title: "Translate", render: translate, options: LANGUAGES },
];

const TONES: &[TemplateOption] = &[
    option("Professional", "professional"),
    option("Casual", "casual"),
    option("Friendly", "friendly"),
    option("Formal", "formal"),
    option("Confident", "confident"),
    option("Empathetic", "empathetic"),
    option("Persuasive", "persuasive"),
    option("Humorous", "humorous"),
];

const LANGUAGES: &[TemplateOption] = &[
    option("English", "English"),
    option("Arabic", "Arabic"),
    option("Chinese", "Chinese"),
    option("Dutch", "Dutch"),
    option("French", "French"),
    option("German", "German"),
    option("Italian", "Italian"),
    option("Japanese", "Japanese"),
    option("Korean", "Korean"),
    option("Portuguese", "Portuguese"),
    option("Russian", "Russian"),
    option("Spanish", "Spanish"),
];

fn change_tone(input: &str, tone: &str) -> String {
    format!("Please rewrite the following text in a {tone} tone, keeping its meaning and language:\n\n{input}")
}

fn summarize(input: &str) -> String {
    format!("Please provide a concise summary of the following text:\n\n{input}")
}

fn brainstorm(input: &str) -> String {
    format!(
        "Your task is to brainstorm ideas.\nCome up with a short list of fresh, concrete ideas related to the following text:\n\n{input}"
    )
}

fn fix_errors(input: &str) -> String {
    format!(
        "Your task is to proofread text.\nFix the spelling, grammar and punctuation errors in the following text without changing its meaning or tone:\n\n{input}"
    )
}

fn compose_reply(input: &str) -> String {
    format!(
        "Your task is to perform the following actions:\n  1 - Find the paragraph delimited by <<<.\n  2 - Compose a reply with the friendly tone.\n\n  <<<{input}<<<\n"
    )
}

fn explain(input: &str) -> String {
    format!("Explain the following text in simple, clear terms:\n\n{input}")
}

fn copywriting(input: &str) -> String {
    format!(
        "Your task is to improve copywriting.\nRewrite the following text so it is clearer, more engaging and more persuasive:\n\n{input}"
    )
}

fn translate(input: &str, language: &str) -> String {
    format!("Your task is to perform a translation:\nTranslate the following text to {language}:\n\n{input}")
}
