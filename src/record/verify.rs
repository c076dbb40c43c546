//! Verification Commands
//!
//! The tuning dialog probes the live page through two inbound commands:
//! descriptor re-resolution and a batch locator check. Exactly one response
//! is produced per recognized request; anything else is ignored without a
//! response.

use crate::record::engine::{Recorder, CHECK_OUTLINE, VERIFY_OUTLINE};
use crate::record::message::ActionSink;
use serde::{Deserialize, Serialize};

/// One locator to probe in a batch check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorProbe {
    pub id: i64,

    /// Lookup method: `id`, `name`, `class`, `tag`, or `xpath`.
    pub method: String,

    pub value: String,

    /// Whether a match should be outlined on the page.
    pub show: bool,
}

/// Inbound diagnostic commands, tagged by `command` on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command")]
pub enum InboundCommand {
    #[serde(rename = "testDescriptor")]
    TestDescriptor { descriptor: String },

    #[serde(rename = "testLocator")]
    TestLocator { locators: Vec<LocatorProbe> },
}

/// Per-probe outcome of a batch locator check. Input order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorCheck {
    pub id: i64,
    pub passed: bool,
    pub show: bool,
}

/// Response to a recognized inbound command.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    /// `"pass"`, or the caught error's message.
    Descriptor { result: String },

    Locators { results: Vec<LocatorCheck> },
}

impl<S: ActionSink> Recorder<S> {
    /// Handles one inbound command. Returns `None` for unrecognized command
    /// names; those get no response at all.
    pub fn handle_command(&mut self, raw: &serde_json::Value) -> Option<CommandResponse> {
        let command: InboundCommand = match serde_json::from_value(raw.clone()) {
            Ok(command) => command,
            Err(_) => {
                log::debug!("Unrecognized inbound command, ignored");
                return None;
            }
        };
        match command {
            InboundCommand::TestDescriptor { descriptor } => {
                Some(self.test_descriptor(&descriptor))
            }
            InboundCommand::TestLocator { locators } => Some(self.test_locators(&locators)),
        }
    }

    /// Re-resolves a descriptor and outlines every match in blue for 1.5 s.
    /// Zero matches still pass; only a parse failure reports its message.
    fn test_descriptor(&mut self, descriptor: &str) -> CommandResponse {
        let result = match self.inspector().parse_descriptor(self.document(), descriptor) {
            Ok(matches) => {
                if matches.is_empty() {
                    log::info!("Descriptor matched no elements");
                }
                for elem in matches {
                    self.document_mut().set_outline(elem, VERIFY_OUTLINE);
                    self.schedule_outline_reset(elem);
                }
                "pass".to_string()
            }
            Err(e) => e.to_string(),
        };
        CommandResponse::Descriptor { result }
    }

    fn test_locators(&mut self, probes: &[LocatorProbe]) -> CommandResponse {
        let mut results = Vec::with_capacity(probes.len());
        for probe in probes {
            let found = self
                .inspector()
                .element_by(self.document(), &probe.method, &probe.value);
            let passed = match found {
                Some(elem) => {
                    let outline = if probe.show { CHECK_OUTLINE } else { "" };
                    self.document_mut().set_outline(elem, outline);
                    true
                }
                None => {
                    log::debug!("Locator {}={} did not resolve", probe.method, probe.value);
                    false
                }
            };
            results.push(LocatorCheck {
                id: probe.id,
                passed,
                show: probe.show,
            });
        }
        CommandResponse::Locators { results }
    }
}
