//! Reserved output keys.

use crate::fields::FieldMap;

/// Raw stack key; never present in an emitted record.
pub const STACK_KEY: &str = "stack";
/// Application identity key, protected once set.
pub const IDENTITY_KEY: &str = "type";
/// Logger class key written into the initial context.
pub const CONTEXT_CLASS_KEY: &str = "context";
/// Level label key.
pub const LEVEL_KEY: &str = "loglevel";
/// Default timestamp key.
pub const TIME_KEY: &str = "time";
/// Process id key.
pub const PID_KEY: &str = "pid";
/// Default message key.
pub const MESSAGE_KEY: &str = "message";
/// Error message key, written only when a separate human message was given.
pub const ERROR_MESSAGE_KEY: &str = "error_message";
/// Relocated stack trace key.
pub const ERROR_STACK_KEY: &str = "error_stack";
/// First-frame file key.
pub const ERROR_FILE_KEY: &str = "error_file";
/// First-frame line key.
pub const ERROR_LINE_KEY: &str = "error_line";
/// Error code key.
pub const ERROR_CODE_KEY: &str = "error_code";

/// Every key the engine writes or strips on its own.
pub const RESERVED_KEYS: [&str; 8] = [
    STACK_KEY,
    IDENTITY_KEY,
    LEVEL_KEY,
    ERROR_MESSAGE_KEY,
    ERROR_STACK_KEY,
    ERROR_FILE_KEY,
    ERROR_LINE_KEY,
    ERROR_CODE_KEY,
];

/// Move a raw `stack` field to `error_stack`.
///
/// An `error_stack` already in the map wins; the raw key is dropped either way.
pub fn relocate_stack(fields: &mut FieldMap) {
    let Some(stack) = fields.remove(STACK_KEY) else {
        return;
    };
    if !fields.contains_key(ERROR_STACK_KEY) {
        fields.insert(ERROR_STACK_KEY, stack);
    }
}
