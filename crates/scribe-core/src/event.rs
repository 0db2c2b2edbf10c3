use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Speaker of a transcript record.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One typed block of a structured message body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    ToolResult {
        tool_use_id: String,
        text: String,
    },
    /// Block types we do not render (thinking, images, ...).
    Other {
        kind: String,
    },
}

impl ContentBlock {
    /// Build a block from one element of a `message.content` array.
    ///
    /// Returns `None` for non-object elements.
    pub fn from_value(block: &Value) -> Option<Self> {
        let obj = block.as_object()?;
        let kind = obj.get("type").and_then(|t| t.as_str()).unwrap_or("");
        let parsed = match kind {
            "text" => ContentBlock::Text {
                text: str_field(block, "text"),
            },
            "tool_use" => {
                // Bash-style tools carry the command under `input.command`.
                let command = block
                    .get("command")
                    .or_else(|| block.get("input").and_then(|i| i.get("command")))
                    .and_then(|c| c.as_str())
                    .map(|c| c.to_string());
                ContentBlock::ToolUse {
                    name: str_field(block, "name"),
                    command,
                }
            }
            "tool_result" => ContentBlock::ToolResult {
                tool_use_id: str_field(block, "tool_use_id"),
                text: flatten_tool_result(block.get("content")),
            },
            other => ContentBlock::Other {
                kind: other.to_string(),
            },
        };
        Some(parsed)
    }

    /// Render the block as plain text. `None` means the block has no textual form.
    pub fn render(&self) -> Option<String> {
        match self {
            ContentBlock::Text { text } => Some(text.clone()),
            ContentBlock::ToolUse { name, command } => Some(match command {
                Some(cmd) => format!("[tool: {name}] {cmd}"),
                None => format!("[tool: {name}]"),
            }),
            ContentBlock::ToolResult { text, .. } => Some(text.clone()),
            ContentBlock::Other { .. } => None,
        }
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .unwrap_or("")
        .to_string()
}

/// Tool results are either a bare string or a list of text blocks.
fn flatten_tool_result(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// A message body: plain text or an ordered list of blocks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn from_value(content: &Value) -> Option<Self> {
        match content {
            Value::String(s) => Some(MessageContent::Text(s.clone())),
            Value::Array(items) => Some(MessageContent::Blocks(
                items.iter().filter_map(ContentBlock::from_value).collect(),
            )),
            _ => None,
        }
    }

    /// Normalize any content shape to plain text.
    ///
    /// Blocks are rendered in order and joined with newlines; blocks without
    /// a textual form are skipped.
    pub fn plain_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::render)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Command strings of every tool invocation in this message.
    pub fn tool_commands(&self) -> impl Iterator<Item = &str> {
        let blocks: &[ContentBlock] = match self {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(b) => b.as_slice(),
        };
        blocks.iter().filter_map(|b| match b {
            ContentBlock::ToolUse {
                command: Some(cmd), ..
            } => Some(cmd.as_str()),
            _ => None,
        })
    }

    /// True when the message carries tool output and nothing a human wrote.
    pub fn is_tool_result_only(&self) -> bool {
        match self {
            MessageContent::Text(_) => false,
            MessageContent::Blocks(blocks) => {
                blocks
                    .iter()
                    .any(|b| matches!(b, ContentBlock::ToolResult { .. }))
                    && blocks.iter().all(|b| {
                        matches!(
                            b,
                            ContentBlock::ToolResult { .. } | ContentBlock::Other { .. }
                        )
                    })
            }
        }
    }
}

/// Where a record was read from. Used only to break timestamp ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin {
    pub file_index: usize,
    pub line: usize,
}

/// One parsed transcript record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationEvent {
    pub session_id: Option<String>,
    pub timestamp: String,
    #[serde(skip)]
    pub at: OffsetDateTime,
    pub origin_project: String,
    pub role: Role,
    pub content: MessageContent,
    #[serde(skip)]
    pub origin: Origin,
}

impl ConversationEvent {
    pub fn text(&self) -> String {
        self.content.plain_text()
    }

    /// Total order used everywhere events are sorted.
    pub fn sort_key(&self) -> (OffsetDateTime, &str, Origin) {
        (self.at, self.timestamp.as_str(), self.origin)
    }
}

/// Sort events chronologically with a deterministic tie-break.
pub fn sort_chronologically(events: &mut [ConversationEvent]) {
    events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
