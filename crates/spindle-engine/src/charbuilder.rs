use spindle_world::Gender;

use crate::dialog::{Dialog, DialogOutcome, DialogStep, Validator};
use crate::session::Session;

/// The answers collected by character creation, ready to be turned into
/// a player living.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerNaming {
    /// Lowercase character name.
    pub name: String,
    /// Chosen gender.
    pub gender: Gender,
    /// Chosen race.
    pub race: String,
    /// Whether the character gets the wizard privilege.
    pub wizard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStep {
    Name,
    Gender,
    Race,
}

/// The character creation conversation: name, gender, race.
///
/// Each question suspends the dialog; an invalid answer re-asks without
/// advancing. Race may be left blank to take the default.
#[derive(Debug)]
pub struct CharacterBuilder {
    step: BuildStep,
    default_race: String,
    wizard: bool,
    name: String,
    gender: Gender,
}

impl CharacterBuilder {
    /// A builder offering `default_race` when the race question is left
    /// blank. `wizard` grants the wizard privilege to the finished
    /// character.
    pub fn new(default_race: impl Into<String>, wizard: bool) -> Self {
        Self {
            step: BuildStep::Name,
            default_race: default_race.into(),
            wizard,
            name: String::new(),
            gender: Gender::Neutral,
        }
    }

    fn ask_name(&self) -> DialogStep {
        DialogStep::Await {
            prompt: "What shall you be called? ".into(),
            validator: Validator::CharacterName,
        }
    }

    fn ask_gender(&self) -> DialogStep {
        DialogStep::Await {
            prompt: "What is your gender (m/f/n)? ".into(),
            validator: Validator::Gender,
        }
    }

    fn ask_race(&self) -> DialogStep {
        DialogStep::Await {
            prompt: format!("What is your race [{}]? ", self.default_race),
            validator: Validator::AnyText,
        }
    }
}

impl Dialog for CharacterBuilder {
    fn name(&self) -> &str {
        "character-builder"
    }

    fn begin(&mut self, session: &mut Session) -> DialogStep {
        session.print("Let's create your character.");
        self.step = BuildStep::Name;
        self.ask_name()
    }

    fn resume(&mut self, session: &mut Session, answer: &str) -> DialogStep {
        match self.step {
            BuildStep::Name => {
                self.name = answer.to_string();
                self.step = BuildStep::Gender;
                self.ask_gender()
            }
            BuildStep::Gender => {
                // The validator already normalized to m/f/n.
                self.gender = Gender::parse(answer).unwrap_or(Gender::Neutral);
                self.step = BuildStep::Race;
                self.ask_race()
            }
            BuildStep::Race => {
                let race = if answer.is_empty() {
                    self.default_race.clone()
                } else {
                    answer.to_lowercase()
                };
                session.print(format!("Welcome, {}.", self.name));
                DialogStep::Done(DialogOutcome::Character(PlayerNaming {
                    name: self.name.clone(),
                    gender: self.gender,
                    race,
                    wizard: self.wizard,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(dialog: &mut CharacterBuilder, session: &mut Session, text: &str) -> DialogStep {
        let DialogStep::Await { validator, .. } = current_step(dialog, session) else {
            panic!("expected a question");
        };
        let normalized = validator.check(text).expect("valid answer");
        dialog.resume(session, &normalized)
    }

    fn current_step(dialog: &mut CharacterBuilder, _session: &mut Session) -> DialogStep {
        match dialog.step {
            BuildStep::Name => dialog.ask_name(),
            BuildStep::Gender => dialog.ask_gender(),
            BuildStep::Race => dialog.ask_race(),
        }
    }

    #[test]
    fn walks_through_all_questions() {
        let mut session = Session::new();
        let mut dialog = CharacterBuilder::new("human", false);
        dialog.begin(&mut session);

        answer(&mut dialog, &mut session, "Julie");
        answer(&mut dialog, &mut session, "f");
        let step = answer(&mut dialog, &mut session, "elf");

        let DialogStep::Done(DialogOutcome::Character(naming)) = step else {
            panic!("expected a finished character");
        };
        assert_eq!(naming.name, "julie");
        assert_eq!(naming.gender, Gender::Female);
        assert_eq!(naming.race, "elf");
        assert!(!naming.wizard);
    }

    #[test]
    fn blank_race_takes_default() {
        let mut session = Session::new();
        let mut dialog = CharacterBuilder::new("human", true);
        dialog.begin(&mut session);

        answer(&mut dialog, &mut session, "merlin");
        answer(&mut dialog, &mut session, "m");
        let step = answer(&mut dialog, &mut session, "");

        let DialogStep::Done(DialogOutcome::Character(naming)) = step else {
            panic!("expected a finished character");
        };
        assert_eq!(naming.race, "human");
        assert!(naming.wizard);
    }

    #[test]
    fn invalid_name_does_not_advance() {
        let mut session = Session::new();
        let mut dialog = CharacterBuilder::new("human", false);
        let DialogStep::Await { validator, .. } = dialog.begin(&mut session) else {
            panic!("expected the name question");
        };
        assert!(validator.check("x!").is_err());
        assert_eq!(dialog.step, BuildStep::Name);
    }
}
