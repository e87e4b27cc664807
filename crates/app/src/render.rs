use exam_core::model::{QuestionStatus, Test, TestResult};
use exam_core::timer::format_clock;
use services::{DashboardStats, QuestionView, SessionController, SubmissionPreview};

pub fn test_list(tests: &[Test]) {
    if tests.is_empty() {
        println!("No tests available.");
        return;
    }
    for test in tests {
        println!(
            "{:<28} {:<5} {:<45} {:>2} q  {:>3} min{}",
            test.id().as_str(),
            test.category().as_str(),
            test.title(),
            test.question_count(),
            test.duration_minutes(),
            if test.negative_marking() { "  (-ve)" } else { "" }
        );
    }
}

pub fn banner(test: &Test) {
    println!();
    println!("{} [{} / {}]", test.title(), test.category(), test.chapter());
    println!(
        "{} questions, {} minutes{}",
        test.question_count(),
        test.duration_minutes(),
        if test.negative_marking() {
            ", wrong answers cost 1 mark"
        } else {
            ""
        }
    );
    println!("Type h for help.");
}

fn status_label(status: QuestionStatus) -> &'static str {
    match status {
        QuestionStatus::Unanswered => "not answered",
        QuestionStatus::Answered => "answered",
        QuestionStatus::Bookmarked => "bookmarked",
        QuestionStatus::AnsweredBookmarked => "answered, bookmarked",
    }
}

fn status_glyph(status: QuestionStatus) -> char {
    match status {
        QuestionStatus::Unanswered => '.',
        QuestionStatus::Answered => '*',
        QuestionStatus::Bookmarked => '?',
        QuestionStatus::AnsweredBookmarked => '!',
    }
}

pub fn question(view: &QuestionView<'_>, total: usize, clock: &str) {
    println!();
    println!(
        "Question {}/{}  ({})  [{clock}]",
        view.number,
        total,
        status_label(view.status)
    );
    println!("{}", view.question.text());
    for (i, option) in view.question.options().iter().enumerate() {
        let marker = if view.answer.selected() == Some(i) { '>' } else { ' ' };
        println!(" {marker} {}. {option}", i + 1);
    }
}

pub fn overview(session: &SessionController) {
    let statuses = session.statuses();
    let grid: String = statuses
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let cursor = if i == session.current_index() { "[" } else { " " };
            format!("{cursor}{}{}", i + 1, status_glyph(*s))
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{grid}");
    if let Some(progress) = session.progress() {
        println!(
            "answered {}  bookmarked {}  answered+bookmarked {}  not answered {}",
            progress.counts.answered,
            progress.counts.bookmarked,
            progress.counts.answered_bookmarked,
            progress.counts.unanswered
        );
    }
}

pub fn preview(preview: &SubmissionPreview) {
    println!();
    println!(
        "Answered {} of {}, {} left blank, {} bookmarked.",
        preview.answered, preview.total, preview.remaining, preview.bookmarked
    );
    println!("Submit now? [y/N]");
}

pub fn result(test: &Test, result: &TestResult, persisted: bool) {
    println!();
    println!("Result for {}", test.title());
    println!("  score      {:.1}%", result.score());
    println!(
        "  correct    {}   wrong {}   skipped {}",
        result.correct(),
        result.wrong(),
        result.skipped()
    );
    println!("  time taken {}", format_clock(result.time_taken_secs()));
    if !persisted {
        println!("  (the result could not be saved to history)");
    }

    for (index, question) in test.questions().iter().enumerate() {
        let picked = result.answers().get(&index).copied().flatten();
        let verdict = match picked {
            None => "skipped",
            Some(option) if question.is_correct(option) => "correct",
            Some(_) => "wrong",
        };
        println!();
        println!("{}. {} ({verdict})", index + 1, question.text());
        if let Some(option) = picked {
            if let Some(text) = question.options().get(option) {
                println!("   your answer: {text}");
            }
        }
        if let Some(text) = question.options().get(question.correct_option()) {
            println!("   correct:     {text}");
        }
        if !question.explanation().is_empty() {
            println!("   {}", question.explanation());
        }
    }
}

pub fn history(results: &[TestResult], stats: &DashboardStats) {
    println!(
        "Last {}: average {:.1}%, best {:.1}%, {} this week",
        stats.total_tests, stats.average_score, stats.best_score, stats.tests_this_week
    );
    if results.is_empty() {
        println!("No attempts yet.");
        return;
    }
    println!();
    for result in results {
        println!(
            "{}  {:<28} {:>5.1}%  {}/{}/{}  {}",
            result.submitted_at().format("%Y-%m-%d %H:%M"),
            result.test_id().as_str(),
            result.score(),
            result.correct(),
            result.wrong(),
            result.skipped(),
            format_clock(result.time_taken_secs())
        );
    }
}
