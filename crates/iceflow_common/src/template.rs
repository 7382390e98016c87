//! Named-placeholder expansion for user-supplied tool commands.
//!
//! Commands such as `write_blif {build_name}.blif` are written once in the
//! project configuration and expanded per build. Only a fixed set of keys is
//! recognized; anything else in braces is left in the output verbatim and
//! reported back to the caller so it can be surfaced as a warning instead of
//! failing later inside an external tool.
//!
//! `{{` and `}}` produce literal braces.

/// The values substituted into command templates.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// The active build name (`{build_name}`).
    pub build_name: &'a str,
}

impl<'a> TemplateVars<'a> {
    /// Creates the variable set for a build.
    pub fn new(build_name: &'a str) -> Self {
        Self { build_name }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        match key {
            "build_name" => Some(self.build_name),
            _ => None,
        }
    }
}

/// The result of expanding one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The expanded text.
    pub text: String,
    /// Placeholder keys that were not recognized and were left as written.
    pub unrecognized: Vec<String>,
}

/// Expands `{key}` placeholders in `template` using `vars`.
pub fn expand(template: &str, vars: &TemplateVars<'_>) -> Expansion {
    let mut text = String::with_capacity(template.len());
    let mut unrecognized = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            text.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('}') {
            // Lone closing brace
            text.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find('}') {
            Some(end) => {
                let key = &tail[1..1 + end];
                match vars.get(key) {
                    Some(value) => text.push_str(value),
                    None => {
                        text.push_str(&tail[..end + 2]);
                        unrecognized.push(key.to_string());
                    }
                }
                rest = &tail[end + 2..];
            }
            None => {
                // Unterminated placeholder
                text.push_str(tail);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    if !unrecognized.is_empty() {
        log::debug!(
            "unrecognized placeholder(s) {:?} left in command `{}`",
            unrecognized,
            template
        );
    }

    Expansion { text, unrecognized }
}
