use serde::{Deserialize, Serialize};

/// Names binding the host to a WebAssembly engine module.
///
/// The bootstrap script is this structure as JSON; missing fields keep their
/// defaults and a blank script selects the defaults outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkageDescriptor {
    /// Exported linear memory.
    pub memory: String,
    /// `(sample_rate: i32) -> i32`, returns 0 when construction is refused.
    pub constructor: String,
    /// `(processor: i32, id: i32, value: f32)`.
    pub set_parameter: String,
    /// `(processor: i32, in_l: i32, in_r: i32, out_l: i32, out_r: i32, frames: i32)`.
    pub process: String,
    /// `(frames: i32) -> i32`, returns a pointer to `frames` f32 samples.
    pub create_buffer: String,
    /// Module name the host imports are offered under.
    pub import_module: String,
    /// `(ptr: i32, len: i32)`, one outgoing message.
    pub emit_import: String,
    /// `(ptr: i32, len: i32)`, one UTF-8 log line.
    pub log_import: String,
}

impl Default for LinkageDescriptor {
    fn default() -> Self {
        Self {
            memory: "memory".into(),
            constructor: "create_processor".into(),
            set_parameter: "set_parameter".into(),
            process: "process".into(),
            create_buffer: "create_buffer".into(),
            import_module: "env".into(),
            emit_import: "emit_message".into(),
            log_import: "log_message".into(),
        }
    }
}

impl LinkageDescriptor {
    pub fn parse(script: &str) -> Result<Self, serde_json::Error> {
        if script.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_script_uses_defaults() {
        assert_eq!(
            LinkageDescriptor::parse("  \n").unwrap(),
            LinkageDescriptor::default()
        );
    }

    #[test]
    fn partial_script_overrides_named_entries() {
        let linkage = LinkageDescriptor::parse(
            r#"{"constructor": "Processor_new", "import_module": "host"}"#,
        )
        .unwrap();
        assert_eq!(linkage.constructor, "Processor_new");
        assert_eq!(linkage.import_module, "host");
        assert_eq!(linkage.process, "process");
    }

    #[test]
    fn unknown_entries_are_rejected() {
        assert!(LinkageDescriptor::parse(r#"{"procces": "x"}"#).is_err());
        assert!(LinkageDescriptor::parse("wasm_bindgen = {}").is_err());
    }
}
