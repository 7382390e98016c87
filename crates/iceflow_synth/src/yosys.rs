//! Yosys synthesis script (`.ys`) generation.
//!
//! The script has a fixed shape:
//!
//! 1. one `read_<lang>` per source, with every include path as `-I<path>`
//! 2. the `keep` attribute normalization
//! 3. user pre-synthesis commands
//! 4. the default `synth_<family>` command, or the user's override list
//! 5. user post-synthesis commands
//!
//! Whatever runs in step 4 must write `<build_name>.blif`; that file is the
//! only thing the place-and-route stage reads from synthesis.

use iceflow_arch::Family;
use iceflow_common::{expand, TemplateVars};

use crate::source::SourceFile;

/// Rewrites string-valued `keep` attributes (`"true"`/`"false"`) into the
/// integer literals yosys expects, and removes `keep` when it is false.
/// Must run before any user command that inspects `keep`.
pub const KEEP_NORMALIZATION: &str =
    "attrmap -tocase keep -imap keep=\"true\" keep=1 -imap keep=\"false\" keep=0 -remove keep=0";

/// Name of the top-level module the default synthesis command targets.
pub const TOP_MODULE: &str = "top";

/// Inputs for one synthesis script.
#[derive(Debug, Clone)]
pub struct SynthesisScript<'a> {
    /// Device family; selects the default `synth_<family>` pass.
    pub family: Family,
    /// Sources, read in order.
    pub sources: &'a [SourceFile],
    /// Include search paths applied to every source.
    pub include_paths: &'a [String],
    /// Build name used for output files and `{build_name}` placeholders.
    pub build_name: &'a str,
    /// Commands run before synthesis.
    pub pre_synthesis: &'a [String],
    /// Replacement for the default synthesis command, if non-empty.
    pub synthesis_override: &'a [String],
    /// Commands run after synthesis.
    pub post_synthesis: &'a [String],
}

/// A rendered synthesis script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YosysScript {
    /// Script commands in order.
    pub commands: Vec<String>,
    /// `(command template, key)` for each placeholder that was not recognized.
    pub unrecognized: Vec<(String, String)>,
}

impl YosysScript {
    /// Returns the script text: the commands joined by newlines.
    pub fn text(&self) -> String {
        self.commands.join("\n")
    }
}

impl SynthesisScript<'_> {
    /// Returns the script file name, `<build_name>.ys`.
    pub fn file_name(&self) -> String {
        format!("{}.ys", self.build_name)
    }

    /// Returns the gate-level netlist synthesis must produce, `<build_name>.blif`.
    pub fn netlist_name(&self) -> String {
        format!("{}.blif", self.build_name)
    }

    /// Returns the default synthesis command for this family and build.
    pub fn default_synthesis_command(&self) -> String {
        format!(
            "synth_{} -top {TOP_MODULE} -blif {}",
            self.family.as_str(),
            self.netlist_name()
        )
    }

    /// Renders the script.
    pub fn render(&self) -> YosysScript {
        let vars = TemplateVars::new(self.build_name);
        let mut commands = Vec::new();
        let mut unrecognized = Vec::new();

        let include_flags: String = self
            .include_paths
            .iter()
            .map(|path| format!(" -I{path}"))
            .collect();
        for source in self.sources {
            commands.push(format!(
                "read_{}{} {}",
                source.language.tag(),
                include_flags,
                source.path
            ));
        }

        commands.push(KEEP_NORMALIZATION.to_string());

        let mut push_user = |templates: &[String], commands: &mut Vec<String>| {
            for template in templates {
                let expansion = expand(template, &vars);
                unrecognized.extend(
                    expansion
                        .unrecognized
                        .into_iter()
                        .map(|key| (template.clone(), key)),
                );
                commands.push(expansion.text);
            }
        };

        push_user(self.pre_synthesis, &mut commands);
        if self.synthesis_override.is_empty() {
            commands.push(self.default_synthesis_command());
        } else {
            log::debug!(
                "synthesis override in use; it must still write {}",
                self.netlist_name()
            );
            push_user(self.synthesis_override, &mut commands);
        }
        push_user(self.post_synthesis, &mut commands);

        YosysScript {
            commands,
            unrecognized,
        }
    }
}
