/// One line of learner input during an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero-based option index.
    Answer(usize),
    Next,
    Previous,
    /// Zero-based question index.
    Goto(usize),
    Bookmark,
    Clear,
    Overview,
    Submit,
    Quit,
    Help,
    Unknown,
}

/// Parse a command. Options and question numbers are typed 1-based.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Unknown;
    };

    if let Some(option) = one_based(head) {
        return Command::Answer(option);
    }

    match head.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "g" | "go" => parts
            .next()
            .and_then(one_based)
            .map_or(Command::Unknown, Command::Goto),
        "m" | "mark" | "bookmark" => Command::Bookmark,
        "x" | "clear" => Command::Clear,
        "o" | "overview" => Command::Overview,
        "s" | "submit" => Command::Submit,
        "q" | "quit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        _ => Command::Unknown,
    }
}

fn one_based(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

/// Whether a confirmation prompt was answered with yes.
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub const HELP: &str = "\
  1-9        choose an option
  n / p      next / previous question
  g <num>    go to question <num>
  m          bookmark / unbookmark
  x          clear your answer
  o          overview of all questions
  s          submit
  q          leave (answers are kept for next time)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_options() {
        assert_eq!(parse("1"), Command::Answer(0));
        assert_eq!(parse(" 4 "), Command::Answer(3));
        assert_eq!(parse("0"), Command::Unknown);
    }

    #[test]
    fn goto_takes_a_question_number() {
        assert_eq!(parse("g 5"), Command::Goto(4));
        assert_eq!(parse("go 1"), Command::Goto(0));
        assert_eq!(parse("g"), Command::Unknown);
        assert_eq!(parse("g zero"), Command::Unknown);
    }

    #[test]
    fn words_and_letters() {
        assert_eq!(parse("N"), Command::Next);
        assert_eq!(parse("prev"), Command::Previous);
        assert_eq!(parse("m"), Command::Bookmark);
        assert_eq!(parse("x"), Command::Clear);
        assert_eq!(parse("submit"), Command::Submit);
        assert_eq!(parse(""), Command::Unknown);
        assert!(is_yes("Y"));
        assert!(!is_yes("n"));
    }
}
