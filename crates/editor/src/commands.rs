//! Line-oriented console commands and their execution against a session.

use std::fmt::Write as _;

use guidebook_core::document::SlugRegistry;
use guidebook_core::{BlockId, Change, EditorSession, Reorder};
use serde_json::{Map, Value};

use crate::error::{CommandError, CommandResult};

pub const HELP: &str = "\
commands:
  add <TYPE> [json]        append a block (HERO, QUICK_INFO, AMENITIES, MAP, GALLERY, HOST_PICK, NOTICE)
  update <block> <json>    merge fields into a block's content
  remove <block>           delete a block
  move <block> <block>     move the first block onto the second one's slot
  compact                  renumber blocks without gaps
  title <text>             rename the guide
  describe [text]          set or clear the description
  list                     show blocks in display order
  status                   show save and publish status
  save                     save now
  retry                    retry a failed save
  publish [slug]           publish, optionally with a custom slug
  unpublish                take the guide offline
  quit                     save pending changes and exit
<block> is a block id or a 1-based position from 'list'.";

/// A block addressed by id or by its 1-based display position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Id(BlockId),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        block_type: String,
        content: Option<Value>,
    },
    Update {
        block: BlockRef,
        partial: Map<String, Value>,
    },
    Remove(BlockRef),
    Move {
        active: BlockRef,
        over: BlockRef,
    },
    Compact,
    Title(String),
    Describe(Option<String>),
    List,
    Status,
    Save,
    Retry,
    Publish(Option<String>),
    Unpublish,
    Help,
    Quit,
}

/// What the console loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> CommandResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, rest) = split_word(line);

    let command = match name.to_ascii_lowercase().as_str() {
        "add" => {
            let (block_type, json) = split_word(rest);
            if block_type.is_empty() {
                return Err(CommandError::Usage("add <TYPE> [json]"));
            }
            let content = if json.is_empty() {
                None
            } else {
                Some(serde_json::from_str(json)?)
            };
            Command::Add {
                block_type: block_type.to_ascii_uppercase(),
                content,
            }
        }
        "update" => {
            let (block, json) = split_word(rest);
            if block.is_empty() || json.is_empty() {
                return Err(CommandError::Usage("update <block> <json>"));
            }
            match serde_json::from_str(json)? {
                Value::Object(partial) => Command::Update {
                    block: parse_block_ref(block)?,
                    partial,
                },
                _ => return Err(CommandError::NotAnObject),
            }
        }
        "remove" | "rm" => match rest {
            "" => return Err(CommandError::Usage("remove <block>")),
            block => Command::Remove(parse_block_ref(block)?),
        },
        "move" | "mv" => {
            let (active, over) = split_word(rest);
            if active.is_empty() || over.is_empty() || over.contains(char::is_whitespace) {
                return Err(CommandError::Usage("move <block> <block>"));
            }
            Command::Move {
                active: parse_block_ref(active)?,
                over: parse_block_ref(over)?,
            }
        }
        "compact" => Command::Compact,
        "title" => match rest {
            "" => return Err(CommandError::Usage("title <text>")),
            title => Command::Title(title.to_string()),
        },
        "describe" => Command::Describe(Some(rest.to_string()).filter(|d| !d.is_empty())),
        "list" | "ls" => Command::List,
        "status" => Command::Status,
        "save" => Command::Save,
        "retry" => Command::Retry,
        "publish" => Command::Publish(Some(rest.to_string()).filter(|s| !s.is_empty())),
        "unpublish" => Command::Unpublish,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_block_ref(raw: &str) -> CommandResult<BlockRef> {
    if let Ok(position) = raw.parse::<usize>() {
        return Ok(BlockRef::Position(position));
    }
    Ok(BlockRef::Id(BlockId::parse(raw)?))
}

fn resolve<R: SlugRegistry>(session: &EditorSession<R>, block: BlockRef) -> CommandResult<BlockId> {
    match block {
        BlockRef::Id(id) => Ok(id),
        BlockRef::Position(position) => position
            .checked_sub(1)
            .and_then(|index| session.blocks().get(index).map(|b| b.id()))
            .ok_or(CommandError::NoSuchPosition(position)),
    }
}

fn change_reply(change: Change, verb: &str, id: BlockId) -> String {
    match change {
        Change::Applied => format!("{verb} {id}"),
        Change::NotFound => format!("no block {id}"),
    }
}

/// Run `command` against the session and describe the result.
pub async fn execute<R: SlugRegistry>(
    session: &mut EditorSession<R>,
    command: Command,
) -> CommandResult<Outcome> {
    let reply = match command {
        Command::Add {
            block_type,
            content,
        } => {
            let id = session.add_block_raw(&block_type, content)?;
            format!("added {block_type} {id}")
        }
        Command::Update { block, partial } => {
            let id = resolve(session, block)?;
            change_reply(session.update_block(id, &partial)?, "updated", id)
        }
        Command::Remove(block) => {
            let id = resolve(session, block)?;
            change_reply(session.remove_block(id), "removed", id)
        }
        Command::Move { active, over } => {
            let active = resolve(session, active)?;
            let over = resolve(session, over)?;
            match session.move_block(active, over) {
                Reorder::Moved { from, to, changed } => format!(
                    "moved {active} from {} to {} ({} renumbered)",
                    from + 1,
                    to + 1,
                    changed.len()
                ),
                Reorder::Unchanged => "nothing to move".to_string(),
                Reorder::NotFound => "block not found in this guide".to_string(),
            }
        }
        Command::Compact => {
            let changed = session.compact();
            format!("{} blocks renumbered", changed.len())
        }
        Command::Title(title) => {
            session.rename(title)?;
            format!("title set to '{}'", session.guide().title())
        }
        Command::Describe(description) => {
            let cleared = description.is_none();
            session.set_description(description)?;
            if cleared {
                "description cleared".to_string()
            } else {
                "description set".to_string()
            }
        }
        Command::List => list(session),
        Command::Status => status(session),
        Command::Save => {
            session.save_now().await?;
            "saved".to_string()
        }
        Command::Retry => {
            session.retry_save().await?;
            "saved".to_string()
        }
        Command::Publish(candidate) => {
            let slug = session.publish(candidate.as_deref()).await?;
            format!("published as '{slug}'")
        }
        Command::Unpublish => {
            if session.unpublish() {
                "unpublished".to_string()
            } else {
                "guide is not published".to_string()
            }
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
    };
    Ok(Outcome::Reply(reply))
}

fn list<R: SlugRegistry>(session: &EditorSession<R>) -> String {
    let blocks = session.blocks();
    if blocks.is_empty() {
        return "(no blocks)".to_string();
    }
    let mut out = String::new();
    for (index, block) in blocks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<10} {} (order {})",
            index + 1,
            block.block_type().as_str(),
            block.id(),
            block.order()
        );
    }
    out.trim_end().to_string()
}

fn status<R: SlugRegistry>(session: &EditorSession<R>) -> String {
    let guide = session.guide();
    let publication = match (guide.is_published(), guide.slug()) {
        (true, Some(slug)) => format!("published as '{slug}'"),
        (false, Some(slug)) => format!("unpublished (slug '{slug}' kept)"),
        _ => "draft".to_string(),
    };
    let save = session
        .save_state()
        .summary()
        .unwrap_or_else(|| "no changes".to_string());
    format!(
        "'{}': {} blocks, {publication}, {save}",
        guide.title(),
        session.blocks().len()
    )
}
