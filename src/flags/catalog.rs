//! Built-in catalog of the aider command-line flags the tool knows about.
//!
//! The database copy is seeded from this list on first run. Command
//! rendering also consults it directly, so a preset builds the same way
//! whether or not the catalog rows have been edited.

use crate::models::{normalize_flag_name, FlagMetadata, ValueType};

pub struct FlagDef {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub value_type: ValueType,
    pub default_value: Option<&'static str>,
    pub requires_value: bool,
    pub is_deprecated: bool,
    pub wizard_visible: bool,
}

impl FlagDef {
    pub fn to_metadata(&self) -> FlagMetadata {
        FlagMetadata {
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category.to_string(),
            value_type: self.value_type,
            default_value: self.default_value.map(str::to_string),
            requires_value: self.requires_value,
            is_deprecated: self.is_deprecated,
            wizard_visible: self.wizard_visible,
        }
    }
}

const fn value(
    name: &'static str,
    category: &'static str,
    value_type: ValueType,
    default_value: Option<&'static str>,
    description: &'static str,
) -> FlagDef {
    FlagDef {
        name,
        description,
        category,
        value_type,
        default_value,
        requires_value: true,
        is_deprecated: false,
        wizard_visible: true,
    }
}

const fn switch(
    name: &'static str,
    category: &'static str,
    default_value: Option<&'static str>,
    description: &'static str,
) -> FlagDef {
    FlagDef {
        name,
        description,
        category,
        value_type: ValueType::Boolean,
        default_value,
        requires_value: false,
        is_deprecated: false,
        wizard_visible: true,
    }
}

const fn hidden(def: FlagDef) -> FlagDef {
    FlagDef { wizard_visible: false, ..def }
}

const fn deprecated(def: FlagDef) -> FlagDef {
    FlagDef { is_deprecated: true, wizard_visible: false, ..def }
}

pub const MAIN_MODEL: &str = "Main model";
pub const API: &str = "API keys and settings";
pub const MODEL: &str = "Model settings";
pub const CACHE: &str = "Cache settings";
pub const REPOMAP: &str = "Repomap settings";
pub const HISTORY: &str = "History files";
pub const OUTPUT: &str = "Output settings";
pub const GIT: &str = "Git settings";
pub const FIXING: &str = "Fixing and committing";
pub const ANALYTICS: &str = "Analytics";
pub const UPGRADING: &str = "Upgrading";
pub const MODES: &str = "Modes";
pub const VOICE: &str = "Voice settings";
pub const OTHER: &str = "Other settings";

use ValueType::{Float, Integer, Path, String as Text};

pub static FLAGS: &[FlagDef] = &[
    // Main model
    value("model", MAIN_MODEL, Text, None, "Specify the model to use for the main chat"),
    hidden(switch("opus", MAIN_MODEL, None, "Use claude-3-opus for the main chat")),
    hidden(switch("sonnet", MAIN_MODEL, None, "Use claude-3-5-sonnet for the main chat")),
    hidden(switch("haiku", MAIN_MODEL, None, "Use claude-3-5-haiku for the main chat")),
    hidden(switch("4o", MAIN_MODEL, None, "Use gpt-4o for the main chat")),
    hidden(switch("mini", MAIN_MODEL, None, "Use gpt-4o-mini for the main chat")),
    hidden(switch("deepseek", MAIN_MODEL, None, "Use deepseek/deepseek-chat for the main chat")),
    hidden(switch("o1-mini", MAIN_MODEL, None, "Use o1-mini for the main chat")),
    hidden(switch("o1-preview", MAIN_MODEL, None, "Use o1-preview for the main chat")),
    deprecated(switch("4", MAIN_MODEL, None, "Use gpt-4-0613 for the main chat")),
    deprecated(switch("35turbo", MAIN_MODEL, None, "Use gpt-3.5-turbo for the main chat")),
    // API keys and settings
    value("openai-api-base", API, Text, None, "Specify the api base url"),
    hidden(value("openai-api-type", API, Text, None, "Specify the api_type (deprecated)")),
    hidden(value("openai-api-version", API, Text, None, "Specify the api_version (deprecated)")),
    hidden(value("openai-api-deployment-id", API, Text, None, "Specify the deployment_id (deprecated)")),
    hidden(value("openai-organization-id", API, Text, None, "Specify the OpenAI organization ID")),
    hidden(value("set-env", API, Text, None, "Set an environment variable, VAR=value")),
    hidden(value("api-key", API, Text, None, "Set an API key for a provider, PROVIDER=KEY")),
    // Model settings
    switch("list-models", MODEL, None, "List known models which match the (partial) model name"),
    value("model-settings-file", MODEL, Path, Some(".aider.model.settings.yml"), "Specify a file with aider model settings for unknown models"),
    value("model-metadata-file", MODEL, Path, Some(".aider.model.metadata.json"), "Specify a file with context window and costs for unknown models"),
    hidden(value("alias", MODEL, Text, None, "Add a model alias, ALIAS:MODEL")),
    value("reasoning-effort", MODEL, Text, None, "Set the reasoning_effort API parameter"),
    value("thinking-tokens", MODEL, Text, None, "Set the thinking token budget for models that support it"),
    switch("verify-ssl", MODEL, Some("true"), "Verify the SSL cert when connecting to models"),
    value("timeout", MODEL, Float, None, "Timeout in seconds for API calls"),
    value("edit-format", MODEL, Text, None, "Specify what edit format the LLM should use"),
    switch("architect", MODEL, None, "Use architect edit format for the main chat"),
    value("weak-model", MODEL, Text, None, "Model for commit messages and chat history summarization"),
    value("editor-model", MODEL, Text, None, "Model to use for editor tasks"),
    value("editor-edit-format", MODEL, Text, None, "Edit format for the editor model"),
    switch("show-model-warnings", MODEL, Some("true"), "Warn about unknown models or models missing settings"),
    value("max-chat-history-tokens", MODEL, Integer, None, "Soft limit on tokens for chat history before summarization"),
    // Cache settings
    FlagDef {
        name: "cache-prompts",
        description: "Enable caching of prompts (default: False)",
        category: CACHE,
        value_type: ValueType::BooleanExplicit,
        default_value: Some("false"),
        requires_value: false,
        is_deprecated: false,
        wizard_visible: true,
    },
    value("cache-keepalive-pings", CACHE, Integer, Some("0"), "Number of times to ping at 5min intervals to keep prompt cache warm (default: 0)"),
    // Repomap settings
    value("map-tokens", REPOMAP, Integer, None, "Suggested number of tokens to use for repo map, use 0 to disable"),
    value("map-refresh", REPOMAP, Text, Some("auto"), "How often to refresh the repo map (always, files, manual, auto)"),
    value("map-multiplier-no-files", REPOMAP, Float, Some("2"), "Multiplier for map tokens when no files are specified"),
    // History files
    value("input-history-file", HISTORY, Path, Some(".aider.input.history"), "Specify the chat input history file"),
    value("chat-history-file", HISTORY, Path, Some(".aider.chat.history.md"), "Specify the chat history file"),
    switch("restore-chat-history", HISTORY, Some("false"), "Restore the previous chat history messages"),
    hidden(value("llm-history-file", HISTORY, Path, None, "Log the conversation with the LLM to this file")),
    // Output settings
    switch("dark-mode", OUTPUT, Some("false"), "Use colors suitable for a dark terminal background"),
    switch("light-mode", OUTPUT, Some("false"), "Use colors suitable for a light terminal background"),
    switch("pretty", OUTPUT, Some("true"), "Enable pretty, colorized output"),
    switch("stream", OUTPUT, Some("true"), "Enable streaming responses"),
    hidden(value("user-input-color", OUTPUT, Text, Some("#00cc00"), "Set the color for user input")),
    hidden(value("tool-output-color", OUTPUT, Text, None, "Set the color for tool output")),
    hidden(value("tool-error-color", OUTPUT, Text, Some("#FF2222"), "Set the color for tool error messages")),
    hidden(value("assistant-output-color", OUTPUT, Text, Some("#0088ff"), "Set the color for assistant output")),
    value("code-theme", OUTPUT, Text, Some("default"), "Set the markdown code theme"),
    switch("show-diffs", OUTPUT, Some("false"), "Show diffs when committing changes"),
    // Git settings
    switch("git", GIT, Some("true"), "Enable looking for a git repo"),
    switch("gitignore", GIT, Some("true"), "Add .aider* to .gitignore"),
    value("aiderignore", GIT, Path, Some(".aiderignore"), "Specify the aider ignore file"),
    switch("subtree-only", GIT, Some("false"), "Only consider files in the current subtree of the git repository"),
    switch("auto-commits", GIT, Some("true"), "Enable auto commit of LLM changes"),
    switch("dirty-commits", GIT, Some("true"), "Enable commits when repo is found dirty"),
    switch("attribute-author", GIT, Some("true"), "Attribute aider code changes in the git author name"),
    switch("attribute-committer", GIT, Some("true"), "Attribute aider commits in the git committer name"),
    hidden(switch("attribute-commit-message-author", GIT, Some("false"), "Prefix commit messages with 'aider: ' if aider authored the changes")),
    hidden(switch("attribute-commit-message-committer", GIT, Some("false"), "Prefix all commit messages with 'aider: '")),
    switch("commit", GIT, None, "Commit all pending changes with a suitable commit message, then exit"),
    value("commit-prompt", GIT, Text, None, "Specify a custom prompt for generating commit messages"),
    switch("dry-run", GIT, Some("false"), "Perform a dry run without modifying files"),
    switch("skip-sanity-check-repo", GIT, Some("false"), "Skip the sanity check for the git repository"),
    switch("watch-files", GIT, Some("false"), "Enable watching files for ai coding comments"),
    // Fixing and committing
    value("lint-cmd", FIXING, Text, None, "Specify lint commands to run for different languages"),
    switch("auto-lint", FIXING, Some("true"), "Enable automatic linting after changes"),
    value("test-cmd", FIXING, Text, None, "Specify command to run tests"),
    switch("auto-test", FIXING, Some("false"), "Enable automatic testing after changes"),
    switch("test", FIXING, None, "Run tests, fix problems found and then exit"),
    switch("lint", FIXING, None, "Lint and fix provided files, or dirty files if none provided"),
    // Analytics
    switch("analytics", ANALYTICS, None, "Enable or disable analytics for the current session"),
    hidden(value("analytics-log", ANALYTICS, Path, None, "Specify a file to log analytics events")),
    hidden(switch("analytics-disable", ANALYTICS, None, "Permanently disable analytics")),
    // Upgrading
    switch("check-update", UPGRADING, Some("true"), "Check for new aider versions on launch"),
    hidden(switch("show-release-notes", UPGRADING, None, "Show release notes on first run of new version")),
    hidden(switch("install-main-branch", UPGRADING, Some("false"), "Install the latest version from the main branch")),
    hidden(switch("upgrade", UPGRADING, Some("false"), "Upgrade aider to the latest version from PyPI")),
    // Modes
    value("message", MODES, Text, None, "Specify a single message to send the LLM, process reply then exit"),
    value("message-file", MODES, Path, None, "Specify a file containing the message to send the LLM"),
    switch("gui", MODES, Some("false"), "Run aider in your browser"),
    switch("copy-paste", MODES, Some("false"), "Enable automatic copy/paste of chat between aider and web UI"),
    switch("apply-clipboard-edits", MODES, Some("false"), "Apply clipboard contents as edits using the main model's editor format"),
    hidden(value("apply", MODES, Path, None, "Apply the changes from the given file instead of running the chat")),
    switch("exit", MODES, Some("false"), "Do all startup activities then exit before accepting user input"),
    switch("show-repo-map", MODES, Some("false"), "Print the repo map and exit"),
    switch("show-prompts", MODES, Some("false"), "Print the system prompts and exit"),
    // Voice settings
    value("voice-format", VOICE, Text, Some("wav"), "Audio format for voice recording (wav, webm, mp3)"),
    value("voice-language", VOICE, Text, Some("en"), "Specify the language for voice using ISO 639-1 code"),
    hidden(value("voice-input-device", VOICE, Text, None, "Specify the input device name for voice recording")),
    // Other settings
    value("file", OTHER, Path, None, "Specify a file to edit (can be used multiple times)"),
    value("read", OTHER, Path, None, "Specify a read-only file (can be used multiple times)"),
    switch("vim", OTHER, Some("false"), "Use VI editing mode in the terminal"),
    value("chat-language", OTHER, Text, None, "Specify the language to use in the chat"),
    switch("yes-always", OTHER, None, "Always say yes to every confirmation"),
    switch("verbose", OTHER, Some("false"), "Enable verbose output"),
    value("encoding", OTHER, Text, Some("utf-8"), "Specify the encoding for input and output"),
    hidden(value("line-endings", OTHER, Text, Some("platform"), "Line endings to use when writing files")),
    hidden(value("config", OTHER, Path, None, "Specify the config file")),
    hidden(value("env-file", OTHER, Path, Some(".env"), "Specify the .env file to load")),
    switch("suggest-shell-commands", OTHER, Some("true"), "Enable suggesting shell commands"),
    switch("fancy-input", OTHER, Some("true"), "Enable fancy input with history and completion"),
    switch("multiline", OTHER, Some("false"), "Enable multi-line input mode with Meta-Enter to submit"),
    switch("notifications", OTHER, Some("false"), "Enable terminal bell notifications when LLM responses are ready"),
    hidden(value("notifications-command", OTHER, Text, None, "Command to run for notifications instead of the terminal bell")),
    switch("detect-urls", OTHER, Some("true"), "Enable detection and offering to add URLs to chat"),
    hidden(value("editor", OTHER, Text, None, "Specify which editor to use for the /editor command")),
    hidden(switch("no-browser", OTHER, None, "Do not open a browser for web-based flows")),
];

/// Looks up a built-in flag by name (leading dashes ignored, `_` read as `-`).
pub fn find(name: &str) -> Option<&'static FlagDef> {
    let name = normalize_flag_name(name);
    FLAGS.iter().find(|f| f.name == name)
}

pub fn default_flags() -> Vec<FlagMetadata> {
    FLAGS.iter().map(FlagDef::to_metadata).collect()
}

/// True when the built-in catalog types the flag as a boolean switch.
pub fn is_boolean(name: &str) -> bool {
    find(name).is_some_and(|f| f.value_type.is_boolean())
}

/// Preset keys whose command-line spelling differs from `--{key}`.
const CLI_ARGS: &[(&str, &str)] = &[
    ("api-base", "--openai-api-base"),
    ("api-type", "--openai-api-type"),
    ("api-version", "--openai-api-version"),
    ("deployment-id", "--openai-api-deployment-id"),
    ("organization-id", "--openai-organization-id"),
    ("settings-file", "--model-settings-file"),
    ("metadata-file", "--model-metadata-file"),
    ("yes", "--yes-always"),
];

/// Command-line spelling of a preset key: table entry, else `--key-with-dashes`.
pub fn cli_arg(name: &str) -> String {
    let key = normalize_flag_name(name);
    CLI_ARGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, arg)| arg.to_string())
        .unwrap_or_else(|| format!("--{key}"))
}
