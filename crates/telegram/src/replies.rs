//! User-facing reply texts.

use relaybot_config::ProviderTag;

pub const WELCOME: &str = "Welcome! You can start using the bot.";

pub const APOLOGY: &str = "Sorry, I couldn't generate a response. Please try again.";

pub const SETGROUP_USAGE: &str = "Please provide a group name. Usage: /setgroup <group_name>";

pub const CHOOSE_AI_FIRST: &str = "Please choose an AI using /chooseai.";

pub const CHOOSE_AI_PROMPT: &str = "Choose the AI you want to talk to:";

pub const HELP: &str = "Available commands:\n\
/start - Check access and get started\n\
/chooseai - Pick the AI you want to talk to\n\
/setgroup <group_name> - Set the group to use with the bot\n\
/help - Show this message\n\n\
Send any other text and it is forwarded to the AI.";

/// Shown when access is denied.
pub fn join_prompt(channel: &str, invite_link: Option<&str>) -> String {
    match invite_link.map(str::trim).filter(|link| !link.is_empty()) {
        Some(link) => {
            format!("Please join our channel {channel} to use this bot.\nJoin here: {link}")
        },
        None => format!("Please join our channel {channel} to use this bot."),
    }
}

pub fn group_set(name: &str) -> String {
    format!("Group '{name}' set. Make sure the bot is an administrator in that group.")
}

pub fn not_integrated(tag: ProviderTag) -> String {
    format!("{tag} is not integrated yet.")
}

pub fn provider_selected(tag: ProviderTag) -> String {
    format!("You selected {tag}. Send me a message to start chatting.")
}

pub fn fixed_provider(tag: ProviderTag) -> String {
    format!("This bot always uses {tag}. Just send me a message.")
}
