use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use studywise_core::{extract_file, grade, Analysis, Config, GeminiClient, QuizQuestion};

use crate::common::{runtime, CliResult};

#[derive(Args)]
pub struct ExtractArgs {
    /// Document to read
    pub file: PathBuf,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Document to analyze (.txt, .md, .pdf, .docx)
    #[arg(required_unless_present = "notes", conflicts_with = "notes")]
    pub file: Option<PathBuf>,

    /// Analyze these notes instead of a file
    #[arg(long)]
    pub notes: Option<String>,

    /// Print the raw JSON analysis
    #[arg(long)]
    pub json: bool,

    /// Take the generated quiz in the terminal
    #[arg(long, conflicts_with = "json")]
    pub take: bool,
}

pub fn run_extract(args: ExtractArgs) -> CliResult {
    let text = runtime()?.block_on(extract_file(&args.file))?;
    println!("{text}");
    Ok(())
}

pub fn run_analyze(args: AnalyzeArgs) -> CliResult {
    let config = Config::load_or_default();
    let client = GeminiClient::from_config(&config.gemini)?;

    let analysis = runtime()?.block_on(async {
        let text = match (&args.file, &args.notes) {
            (Some(file), _) => extract_file(file).await?,
            (None, Some(notes)) if !notes.trim().is_empty() => notes.clone(),
            _ => return Err(studywise_core::ExtractError::Empty.into()),
        };
        let analysis: Analysis = client.analyze(&text).await?;
        Ok::<_, Box<dyn std::error::Error>>(analysis)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Summary\n=======\n{}\n", analysis.summary.trim());
    if analysis.quiz.is_empty() {
        println!("No quiz could be generated from this text.");
        return Ok(());
    }

    if args.take {
        take_quiz(&analysis.quiz)
    } else {
        print_quiz(&analysis.quiz);
        Ok(())
    }
}

fn print_quiz(quiz: &[QuizQuestion]) {
    println!("Quiz ({} questions)\n====", quiz.len());
    for (i, q) in quiz.iter().enumerate() {
        println!("{}. {}", i + 1, q.question);
        for (letter, option) in ('a'..).zip(&q.options) {
            let mark = if *option == q.correct_answer { "*" } else { " " };
            println!("   {mark}{letter}) {option}");
        }
    }
}

fn take_quiz(quiz: &[QuizQuestion]) -> CliResult {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = HashMap::new();

    for (i, q) in quiz.iter().enumerate() {
        println!("\n{}/{}. {}", i + 1, quiz.len(), q.question);
        for (letter, option) in ('a'..).zip(&q.options) {
            println!("   {letter}) {option}");
        }
        print!("answer (a-d, blank to skip): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if let Some(choice) = parse_choice(&line, q) {
            answers.insert(i, choice);
        }
    }

    let score = grade(quiz, &answers);
    println!("\nScore: {}/{} ({}%)", score.correct, score.total, score.percent());
    for r in score.results.iter().filter(|r| !r.is_correct) {
        println!(
            "  {}. correct answer: {}",
            r.index + 1,
            r.correct_answer
        );
    }
    Ok(())
}

/// Letter `a`..`d` to the option text.
fn parse_choice(input: &str, q: &QuizQuestion) -> Option<String> {
    let c = input.trim().chars().next()?.to_ascii_lowercase();
    let idx = (c as usize).checked_sub('a' as usize)?;
    q.options.get(idx).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_letters_map_to_options() {
        let q = QuizQuestion {
            question: "Q".into(),
            options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
            correct_answer: "x".into(),
            explanation: None,
        };
        assert_eq!(parse_choice("b", &q).as_deref(), Some("x"));
        assert_eq!(parse_choice(" D\n", &q).as_deref(), Some("z"));
        assert!(parse_choice("e", &q).is_none());
        assert!(parse_choice("", &q).is_none());
        assert!(parse_choice("1", &q).is_none());
    }
}
