use anyhow::bail;
use anyhow::Result;

use crate::domain::models::Message;
use crate::domain::models::SlashCommand;

#[cfg(test)]
#[path = "code_blocks_test.rs"]
mod tests;

fn parse_index(text: &str) -> Result<usize> {
    let index = text.trim().parse::<usize>()?;
    if index == 0 {
        bail!("Code block numbers start at 1");
    }

    return Ok(index - 1);
}

/// Every fenced code block of the conversation, numbered in the order the
/// bubbles show them.
#[derive(Default)]
pub struct CodeBlocks {
    codeblocks: Vec<String>,
}

impl CodeBlocks {
    pub fn replace_from_messages(&mut self, messages: &[Message]) {
        self.codeblocks = messages
            .iter()
            .flat_map(|msg| {
                return msg.codeblocks();
            })
            .collect();
    }

    /// Accepts `N`, `N,M` and inclusive `N..M` selections. No selection means
    /// the last code block.
    pub fn blocks_from_slash_commands(&self, command: &SlashCommand) -> Result<String> {
        if self.codeblocks.is_empty() {
            return Ok("".to_string());
        }

        let args = command
            .args
            .iter()
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty())
            .collect::<Vec<String>>();

        if args.is_empty() {
            return Ok(self.codeblocks[self.codeblocks.len() - 1].to_string());
        }

        let mut indexes = vec![];
        for arg in args.iter() {
            for part in arg.split(',').filter(|e| return !e.trim().is_empty()) {
                if let Some((first, last)) = part.split_once("..") {
                    let first = parse_index(first)?;
                    let last = parse_index(last)?;
                    indexes.extend(first..=last);
                } else {
                    indexes.push(parse_index(part)?);
                }
            }
        }

        for index in indexes.iter() {
            if self.codeblocks.get(*index).is_none() {
                bail!("Code block {} does not exist", index + 1);
            }
        }

        let res = indexes
            .iter()
            .map(|idx| return self.codeblocks[*idx].to_string())
            .collect::<Vec<String>>()
            .join("\n\n");

        return Ok(res);
    }
}
