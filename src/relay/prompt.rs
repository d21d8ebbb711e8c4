//! Outbound prompt construction.
//!
//! User text is interpolated verbatim. Nothing is escaped, so a prompt that
//! contains template-like text simply becomes part of the instruction.

const EXPLAIN_PREFIX: &str = "Explain this code in clear, concise terms:\n\n";

/// What the caller asked the model to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task<'a> {
    Generate {
        language: &'a str,
        complexity: &'a str,
    },
    Explain,
}

impl Task<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Generate { .. } => "generate",
            Task::Explain => "explain",
        }
    }

    /// Build the text sent to the provider for `prompt`.
    pub fn render(&self, prompt: &str) -> String {
        match *self {
            Task::Generate {
                language,
                complexity,
            } => generate_prompt(prompt, language, complexity),
            Task::Explain => format!("{EXPLAIN_PREFIX}{prompt}"),
        }
    }
}

fn generate_prompt(task: &str, language: &str, complexity: &str) -> String {
    format!(
        "You are a code generator. Respond with code only.\n\
         Your answer is pasted straight into an editor, so it must run as-is and stay easy to read and maintain.\n\
         Return exactly one fenced code block using the syntax of the requested language.\n\
         \n\
         Task: {task}\n\
         \n\
         Requirements:\n\
         - Language: {language}\n\
         - Complexity: {complexity}\n\
         - Follow best practices for {language}\n\
         - Keep the code clean and concise\n\
         - Comment only logic that is genuinely complex\n\
         - Do NOT include usage examples\n\
         - Do NOT include logging or print statements unless the task asks for them\n\
         - Do NOT include commented-out code\n\
         - Do NOT write any text outside the code block\n\
         \n\
         Your entire response must be a single code block and nothing else.\n"
    )
}
