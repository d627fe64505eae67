use anyhow::{Context, Result, bail};
use engine::{Command, Direction, Item, Settings};

/// One line typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Open,
    Close,
    Next,
    Previous,
    TogglePlay,
    Jump(usize),
    Loop(bool),
    Random(bool),
    AutoAdvance(bool),
    Seek(f64),
    Volume(f32),
    Fullscreen,
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "commands: open | close | next | prev | play | jump N | loop on|off | \
random on|off | auto on|off | seek S | volume V | fullscreen | save | help | quit";

/// Parses one stdin line.
pub fn parse_line(line: &str) -> Result<Input> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        bail!("empty command");
    };
    let argument = words.next();
    if words.next().is_some() {
        bail!("too many arguments for `{word}`");
    }

    let input = match (word, argument) {
        ("open", None) => Input::Open,
        ("close", None) => Input::Close,
        ("next" | "n", None) => Input::Next,
        ("prev" | "p", None) => Input::Previous,
        ("play" | "pause", None) => Input::TogglePlay,
        ("jump", Some(index)) => Input::Jump(
            index
                .parse()
                .with_context(|| format!("invalid item index `{index}`"))?,
        ),
        ("loop", Some(flag)) => Input::Loop(parse_switch(flag)?),
        ("random", Some(flag)) => Input::Random(parse_switch(flag)?),
        ("auto", Some(flag)) => Input::AutoAdvance(parse_switch(flag)?),
        ("seek", Some(seconds)) => Input::Seek(
            seconds
                .parse()
                .with_context(|| format!("invalid seek position `{seconds}`"))?,
        ),
        ("volume", Some(level)) => Input::Volume(
            level
                .parse()
                .with_context(|| format!("invalid volume `{level}`"))?,
        ),
        ("fullscreen", None) => Input::Fullscreen,
        ("save", None) => Input::Save,
        ("help" | "?", None) => Input::Help,
        ("quit" | "exit" | "q", None) => Input::Quit,
        (word, _) => bail!("unknown command `{line}` (starting with `{word}`); try `help`"),
    };
    Ok(input)
}

fn parse_switch(flag: &str) -> Result<bool> {
    match flag {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => bail!("expected on or off, got `{other}`"),
    }
}

/// Control-surface state kept by the terminal front-end.
#[derive(Debug)]
pub struct Operator {
    items: Vec<Item>,
    settings: Settings,
}

impl Operator {
    pub fn new(items: Vec<Item>, settings: Settings) -> Self {
        Self {
            items,
            settings: settings.normalized(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Translates an input into a coordinator command.
    ///
    /// Returns `None` for inputs handled by the front-end itself.
    pub fn command_for(&mut self, input: Input) -> Option<Command> {
        let command = match input {
            Input::Open => Command::Open {
                items: self.items.clone(),
                settings: self.settings,
            },
            Input::Close => Command::Close,
            Input::Next => Command::Advance(Direction::Next),
            Input::Previous => Command::Advance(Direction::Previous),
            Input::TogglePlay => Command::TogglePlayPause,
            Input::Jump(item_index) => Command::JumpTo { item_index },
            Input::Loop(enabled) => {
                self.settings.loop_playback = enabled;
                self.settings_command()
            }
            Input::Random(enabled) => {
                self.settings.random = enabled;
                self.settings_command()
            }
            Input::AutoAdvance(enabled) => {
                self.settings.enable_auto_advance = enabled;
                self.settings_command()
            }
            Input::Seek(seconds) => Command::SeekVideo { seconds },
            Input::Volume(level) => Command::SetVolume {
                level: level.clamp(0.0, 1.0),
            },
            Input::Fullscreen => Command::ToggleFullscreen,
            Input::Save | Input::Help | Input::Quit => return None,
        };
        Some(command)
    }

    fn settings_command(&mut self) -> Command {
        self.settings = self.settings.normalized();
        Command::UpdateSettings(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use engine::{Command, Direction, Item, ItemKind, Settings};

    use super::{Input, Operator, parse_line};

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_line("jump 3").expect("jump"), Input::Jump(3));
        assert_eq!(parse_line("  loop on ").expect("loop"), Input::Loop(true));
        assert_eq!(parse_line("seek 12.5").expect("seek"), Input::Seek(12.5));
        assert_eq!(parse_line("next").expect("next"), Input::Next);
        assert_eq!(parse_line("quit").expect("quit"), Input::Quit);
    }

    #[test]
    fn rejects_unknown_and_malformed_commands() {
        assert!(parse_line("dance").is_err());
        assert!(parse_line("jump two").is_err());
        assert!(parse_line("loop maybe").is_err());
        assert!(parse_line("next 2 3").is_err());
        assert!(parse_line("   ").is_err());
    }

    #[test]
    fn open_carries_loaded_items_and_current_settings() {
        let items = vec![Item::new("a", ItemKind::Image, "a.png")];
        let mut operator = Operator::new(items.clone(), Settings::default());

        let command = operator.command_for(Input::Open).expect("open command");

        assert_eq!(
            command,
            Command::Open {
                items,
                settings: Settings::default(),
            }
        );
    }

    #[test]
    fn random_without_loop_is_normalized_away() {
        let mut operator = Operator::new(Vec::new(), Settings::default());

        let command = operator
            .command_for(Input::Random(true))
            .expect("settings command");

        let Command::UpdateSettings(settings) = command else {
            panic!("expected Command::UpdateSettings");
        };
        assert!(!settings.random);
        assert!(!operator.settings().random);
    }

    #[test]
    fn navigation_inputs_map_to_advance() {
        let mut operator = Operator::new(Vec::new(), Settings::default());

        assert_eq!(
            operator.command_for(Input::Previous),
            Some(Command::Advance(Direction::Previous))
        );
        assert_eq!(operator.command_for(Input::Save), None);
    }

    #[test]
    fn volume_is_clamped() {
        let mut operator = Operator::new(Vec::new(), Settings::default());

        assert_eq!(
            operator.command_for(Input::Volume(3.0)),
            Some(Command::SetVolume { level: 1.0 })
        );
    }
}
