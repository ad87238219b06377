pub const PIN_LENGTH: usize = 4;

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinOutcome {
    /// Fewer than four digits entered so far.
    Pending,
    Authenticated,
    /// No PIN existed; this entry becomes the PIN and authenticates.
    /// The caller persists it.
    PinSet(String),
    /// Wrong PIN. The entry has been cleared.
    Rejected,
}

/// Digit-by-digit entry gate for the parent panel.
#[derive(Clone, Debug)]
pub struct PinPad {
    stored: Option<String>,
    input: String,
}

impl PinPad {
    pub fn new(stored: Option<&str>) -> Self {
        Self {
            stored: stored.map(str::to_string),
            input: String::with_capacity(PIN_LENGTH),
        }
    }

    pub fn prompt(&self) -> &'static str {
        if self.stored.is_some() {
            "Enter Parent PIN"
        } else {
            "Set Parent PIN"
        }
    }

    pub fn entered(&self) -> usize {
        self.input.len()
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Non-digits are ignored.
    pub fn push_digit(&mut self, digit: char) -> PinOutcome {
        if !digit.is_ascii_digit() || self.input.len() >= PIN_LENGTH {
            return PinOutcome::Pending;
        }
        self.input.push(digit);
        if self.input.len() < PIN_LENGTH {
            return PinOutcome::Pending;
        }

        let entry = std::mem::take(&mut self.input);
        match &self.stored {
            None => {
                self.stored = Some(entry.clone());
                PinOutcome::PinSet(entry)
            }
            Some(pin) if *pin == entry => PinOutcome::Authenticated,
            Some(_) => {
                tracing::info!("rejected parent PIN entry");
                PinOutcome::Rejected
            }
        }
    }

    /// Feed a whole string through `push_digit`, returning the final outcome.
    pub fn enter(&mut self, digits: &str) -> PinOutcome {
        self.clear();
        let mut outcome = PinOutcome::Pending;
        for c in digits.chars() {
            outcome = self.push_digit(c);
            if outcome != PinOutcome::Pending {
                break;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_sets_pin() {
        let mut pad = PinPad::new(None);
        assert_eq!(pad.prompt(), "Set Parent PIN");
        assert_eq!(pad.push_digit('1'), PinOutcome::Pending);
        assert_eq!(pad.push_digit('2'), PinOutcome::Pending);
        assert_eq!(pad.push_digit('3'), PinOutcome::Pending);
        assert_eq!(pad.push_digit('4'), PinOutcome::PinSet("1234".into()));
        assert_eq!(pad.prompt(), "Enter Parent PIN");
        assert_eq!(pad.enter("1234"), PinOutcome::Authenticated);
    }

    #[test]
    fn wrong_pin_is_rejected_and_cleared() {
        let mut pad = PinPad::new(Some("4321"));
        assert_eq!(pad.enter("1234"), PinOutcome::Rejected);
        assert_eq!(pad.entered(), 0);
        assert_eq!(pad.enter("4321"), PinOutcome::Authenticated);
    }

    #[test]
    fn editing_the_entry() {
        let mut pad = PinPad::new(Some("1200"));
        pad.push_digit('1');
        pad.push_digit('9');
        pad.backspace();
        pad.push_digit('x');
        assert_eq!(pad.entered(), 1);
        pad.push_digit('2');
        pad.push_digit('0');
        assert_eq!(pad.push_digit('0'), PinOutcome::Authenticated);

        pad.push_digit('5');
        pad.clear();
        assert_eq!(pad.entered(), 0);
    }

    #[test]
    fn short_entry_stays_pending() {
        let mut pad = PinPad::new(Some("1234"));
        assert_eq!(pad.enter("12"), PinOutcome::Pending);
    }

    #[test]
    fn pin_validation() {
        assert!(is_valid_pin("0042"));
        assert!(!is_valid_pin("42"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
    }
}
