use spindle_world::Gender;

use crate::charbuilder::PlayerNaming;
use crate::session::Session;

/// Why an answer was rejected. The text is shown to the player verbatim
/// before the same question is asked again.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// How to check and normalize an answer before a dialog sees it.
///
/// A closed set rather than closures so a suspended dialog's expectations
/// can be reasoned about (and, where needed, persisted) without trait
/// objects in the data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Accept anything, including the empty string. Trims only.
    AnyText,
    /// Reject blank answers.
    NonEmpty,
    /// Accept yes/y or no/n in any case; normalizes to "yes" or "no".
    YesNo,
    /// Accept a grammatical gender; normalizes to its single letter.
    Gender,
    /// A character name: letters only, 3 to 20 of them; normalizes to
    /// lowercase.
    CharacterName,
    /// One of a fixed set of lowercase words.
    OneOf(Vec<String>),
}

impl Validator {
    /// Check an answer, returning the normalized form or a player-facing
    /// rejection.
    pub fn check(&self, input: &str) -> Result<String, ValidationError> {
        let trimmed = input.trim();
        match self {
            Self::AnyText => Ok(trimmed.to_string()),
            Self::NonEmpty => {
                if trimmed.is_empty() {
                    Err(ValidationError("Please type something.".into()))
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Self::YesNo => match trimmed.to_lowercase().as_str() {
                "y" | "yes" => Ok("yes".into()),
                "n" | "no" => Ok("no".into()),
                _ => Err(ValidationError("Please answer yes or no.".into())),
            },
            Self::Gender => Gender::parse(trimmed)
                .map(|g| g.letter().to_string())
                .ok_or_else(|| {
                    ValidationError("Please answer m(ale), f(emale) or n(eutral).".into())
                }),
            Self::CharacterName => {
                let lower = trimmed.to_lowercase();
                let ok = (3..=20).contains(&lower.chars().count())
                    && lower.chars().all(|c| c.is_ascii_alphabetic());
                if ok {
                    Ok(lower)
                } else {
                    Err(ValidationError(
                        "Names are 3 to 20 letters, nothing else.".into(),
                    ))
                }
            }
            Self::OneOf(choices) => {
                let lower = trimmed.to_lowercase();
                if choices.iter().any(|c| c == &lower) {
                    Ok(lower)
                } else {
                    Err(ValidationError(format!(
                        "Please choose one of: {}.",
                        choices.join(", ")
                    )))
                }
            }
        }
    }
}

/// What a dialog wants next.
#[derive(Debug)]
pub enum DialogStep {
    /// Ask the player something and suspend until a valid answer arrives.
    Await {
        /// The prompt to show.
        prompt: String,
        /// How to vet the answer before resuming.
        validator: Validator,
    },
    /// The dialog is finished.
    Done(DialogOutcome),
}

/// What a finished dialog asks the driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Restore the existing savegame.
    LoadSavedGame,
    /// Start a fresh game (character creation follows).
    StartNewGame,
    /// Character creation finished with this naming.
    Character(PlayerNaming),
}

/// A suspendable conversation that owns the input stream while active.
///
/// The driver runs at most one dialog at a time. While one is active,
/// every input line is validated by the pending [`Validator`] and fed to
/// [`Dialog::resume`]; a rejected line re-asks the same question without
/// advancing the dialog. Regular command processing stays suspended until
/// the dialog returns [`DialogStep::Done`].
pub trait Dialog: Send {
    /// A short name for event records.
    fn name(&self) -> &str;

    /// Start the conversation. May print introductory text.
    fn begin(&mut self, session: &mut Session) -> DialogStep;

    /// Continue with a validated, normalized answer.
    fn resume(&mut self, session: &mut Session, answer: &str) -> DialogStep;
}

/// The login conversation: offers to restore an existing save.
///
/// Only started when a save file exists and saves are enabled; otherwise
/// the driver goes straight to character creation.
#[derive(Debug, Default)]
pub struct LoginDialog;

impl Dialog for LoginDialog {
    fn name(&self) -> &str {
        "login"
    }

    fn begin(&mut self, session: &mut Session) -> DialogStep {
        session.print("A saved game exists for this story.");
        DialogStep::Await {
            prompt: "Load the saved game? (yes/no) ".into(),
            validator: Validator::YesNo,
        }
    }

    fn resume(&mut self, _session: &mut Session, answer: &str) -> DialogStep {
        if answer == "yes" {
            DialogStep::Done(DialogOutcome::LoadSavedGame)
        } else {
            DialogStep::Done(DialogOutcome::StartNewGame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_no_normalizes() {
        assert_eq!(Validator::YesNo.check(" Y ").unwrap(), "yes");
        assert_eq!(Validator::YesNo.check("no").unwrap(), "no");
        assert!(Validator::YesNo.check("maybe").is_err());
    }

    #[test]
    fn character_name_rules() {
        assert_eq!(Validator::CharacterName.check("Julie").unwrap(), "julie");
        assert!(Validator::CharacterName.check("jo").is_err());
        assert!(Validator::CharacterName.check("jo3l").is_err());
        assert!(Validator::CharacterName.check("two words").is_err());
    }

    #[test]
    fn one_of_matches_case_insensitively() {
        let v = Validator::OneOf(vec!["red".into(), "blue".into()]);
        assert_eq!(v.check("BLUE").unwrap(), "blue");
        assert!(v.check("green").is_err());
    }

    #[test]
    fn login_dialog_routes_answer() {
        let mut session = Session::new();
        let mut dialog = LoginDialog;

        let step = dialog.begin(&mut session);
        let DialogStep::Await { validator, .. } = step else {
            panic!("login should ask");
        };
        assert_eq!(validator, Validator::YesNo);

        let step = dialog.resume(&mut session, "yes");
        assert!(matches!(
            step,
            DialogStep::Done(DialogOutcome::LoadSavedGame)
        ));
    }
}
