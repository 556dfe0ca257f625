/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/setgroup <name>`; the name keeps its words joined by single spaces.
    SetGroup(Option<String>),
    ChooseAi,
    /// Any other slash command, lowercased, without the leading `/`.
    Other(String),
}

/// Parse `text` as a slash command.
///
/// Returns `None` for plain text. `/cmd@name` forms are honoured only when
/// `name` is this bot; commands addressed to another bot are ignored.
pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let rest = text.trim_start().strip_prefix('/')?;
    let mut words = rest.split_whitespace();
    let head = words.next()?;

    let name = match head.split_once('@') {
        Some((name, target)) => {
            let ours = bot_username.is_some_and(|u| u.eq_ignore_ascii_case(target));
            if !ours {
                return Some(Command::Other(head.to_lowercase()));
            }
            name
        },
        None => head,
    };

    let cmd = match name.to_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "chooseai" => Command::ChooseAi,
        "setgroup" => {
            let args: Vec<&str> = words.collect();
            Command::SetGroup((!args.is_empty()).then(|| args.join(" ")))
        },
        other => Command::Other(other.to_string()),
    };
    Some(cmd)
}
