//! Quiz command handlers
//!
//! `quiz generate` submits a job and then polls its status until the
//! quiz is ready. Running out of checks is not an error: the job keeps
//! running on the server and `quiz show` picks it up later.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use spellbook_client::{JobPoller, PollError, PollerConfig, SpellbookClient};
use spellbook_core::domain::quiz::{Question, Quiz};
use spellbook_core::dto::job::SubmitJob;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::{parse_job_id, resolve_class_id};

/// Quiz subcommands
#[derive(Subcommand)]
pub enum QuizCommands {
    /// Generate a quiz from the notes of a class
    Generate {
        /// Class id, id prefix or name
        class: String,

        /// Number of questions
        #[arg(short = 'n', long, default_value = "10")]
        questions: u32,

        /// Topics to focus on (repeatable)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Print the job id and return without waiting
        #[arg(long)]
        no_wait: bool,

        /// Milliseconds between status checks (overrides POLL_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Status checks before giving up (overrides MAX_POLL_ATTEMPTS)
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Check whether a quiz is ready
    Status {
        /// Job id
        job: String,
    },
    /// Show a generated quiz with its answers
    Show {
        /// Job id
        job: String,
    },
    /// Take a quiz interactively, record the score and review mistakes
    Take {
        /// Job id
        job: String,
    },
    /// Record a score for a quiz
    Score {
        /// Job id
        job: String,

        /// Score between 0 and 100
        score: f64,
    },
    /// Get review topics for the questions answered wrong
    Review {
        /// Job id
        job: String,

        /// Zero-based indices of the wrong questions
        #[arg(required = true, value_delimiter = ',')]
        wrong: Vec<usize>,
    },
    /// Show the pending job queue
    Queue,
}

pub async fn handle_quiz_command(command: QuizCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        QuizCommands::Generate {
            class,
            questions,
            topics,
            no_wait,
            interval_ms,
            max_attempts,
        } => {
            let class_id = resolve_class_id(&client, &class).await?;
            let mut poller_config = PollerConfig::from_env()?;
            if let Some(ms) = interval_ms {
                poller_config.interval = Duration::from_millis(ms);
            }
            if let Some(attempts) = max_attempts {
                poller_config.max_attempts = attempts;
            }
            poller_config.validate()?;

            let req = SubmitJob {
                class_id: Some(class_id),
                num_questions: Some(questions),
                topics: (!topics.is_empty()).then_some(topics),
            };
            generate(&client, req, poller_config, no_wait).await
        }
        QuizCommands::Status { job } => {
            let job_id = parse_job_id(&job)?;
            let ready = client.job_status(job_id).await?;
            if ready {
                println!("{} Quiz {} is ready", "✓".green(), job_id.to_string().cyan());
            } else {
                println!(
                    "{} Quiz {} is still processing",
                    "…".yellow(),
                    job_id.to_string().cyan()
                );
            }
            Ok(())
        }
        QuizCommands::Show { job } => {
            let job_id = parse_job_id(&job)?;
            let quiz: Quiz = client.job_result(job_id).await?;
            print_quiz(&quiz, true);
            Ok(())
        }
        QuizCommands::Take { job } => {
            let job_id = parse_job_id(&job)?;
            take_quiz(&client, job_id).await
        }
        QuizCommands::Score { job, score } => {
            let job_id = parse_job_id(&job)?;
            let record = client.submit_score(job_id, score).await?;
            println!(
                "{} Recorded score {} for quiz {}",
                "✓".green(),
                format!("{:.1}", record.score).bold(),
                record.job_id.to_string().dimmed()
            );
            Ok(())
        }
        QuizCommands::Review { job, wrong } => {
            let job_id = parse_job_id(&job)?;
            review(&client, job_id, wrong).await
        }
        QuizCommands::Queue => {
            let snapshot = client.queue_snapshot().await?;
            println!("{}", "Job Queue:".bold());
            println!("  Pending: {}", snapshot.size);
            if let Some(head) = snapshot.head {
                println!("  Next:    {}", head.job_id.to_string().cyan());
                println!("  Notes:   {}", head.input_refs.len());
            }
            Ok(())
        }
    }
}

async fn generate(
    client: &SpellbookClient,
    req: SubmitJob,
    poller_config: PollerConfig,
    no_wait: bool,
) -> Result<()> {
    let job_id = client.submit_job(req).await?;
    println!("{} Submitted quiz job {}", "✓".green(), job_id.to_string().cyan());

    if no_wait {
        println!(
            "  Check on it with: {}",
            format!("spellbook quiz status {}", job_id).dimmed()
        );
        return Ok(());
    }

    let mut poller = JobPoller::new(job_id, client.clone(), poller_config);
    let cancel = poller.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let max_attempts = poller_config.max_attempts;
    let outcome = poller
        .run_with::<Quiz, _>(|attempt| {
            println!(
                "  {} still generating ({}/{})",
                "…".yellow(),
                attempt,
                max_attempts
            );
        })
        .await;
    ctrl_c.abort();

    match outcome {
        Ok(quiz) => {
            println!("{}", "✓ Quiz ready".green().bold());
            println!();
            print_quiz(&quiz, false);
            println!();
            println!(
                "  Take it with: {}",
                format!("spellbook quiz take {}", job_id).dimmed()
            );
            Ok(())
        }
        Err(PollError::TimedOut { .. }) => {
            println!("{}", "Still processing, check back later.".yellow());
            println!(
                "  {}",
                format!("spellbook quiz show {}", job_id).dimmed()
            );
            Ok(())
        }
        Err(PollError::Cancelled(_)) => {
            println!("{}", "Stopped waiting; the job keeps running.".yellow());
            println!(
                "  {}",
                format!("spellbook quiz status {}", job_id).dimmed()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn take_quiz(client: &SpellbookClient, job_id: Uuid) -> Result<()> {
    let quiz: Quiz = client.job_result(job_id).await?;
    let (questions, skipped) = answerable_questions(&quiz);
    for index in &skipped {
        println!(
            "{} Skipping question {}: it has no valid answer choices",
            "!".yellow(),
            index + 1
        );
    }
    if questions.is_empty() {
        bail!("Quiz {} has no answerable questions", job_id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut wrong = Vec::new();

    for &(index, question) in &questions {
        print_question(index, question, false);

        let choice = loop {
            print!("  Your answer (1-{}): ", question.answers.len());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                bail!("Input closed before the quiz was finished");
            };
            match parse_choice(&line, question.answers.len()) {
                Some(choice) => break choice,
                None => println!("  {}", "Please enter one of the listed numbers".yellow()),
            }
        };

        if choice == question.correct_answer_index {
            println!("  {}", "✓ Correct".green());
        } else {
            let correct = question.correct_answer().unwrap_or("?");
            println!("  {} {}", "✗ Correct answer:".red(), correct);
            wrong.push(index);
        }
        println!();
    }

    let score = score_percent(questions.len(), wrong.len());
    println!("{}", "─".repeat(60).dimmed());
    println!("  Score: {}", format!("{:.1}", score).bold());

    match client.submit_score(job_id, score).await {
        Ok(_) => println!("{} Score recorded", "✓".green()),
        Err(e) if e.is_client_error() => {
            println!("{} Score not recorded: {}", "!".yellow(), e.message())
        }
        Err(e) => return Err(e.into()),
    }

    if !wrong.is_empty() {
        println!();
        review(client, job_id, wrong).await?;
    }

    Ok(())
}

async fn review(client: &SpellbookClient, job_id: Uuid, wrong: Vec<usize>) -> Result<()> {
    let topics = client.review_topics(job_id, wrong).await?;

    if topics.is_empty() {
        println!("{}", "Nothing to review".yellow());
        return Ok(());
    }

    println!("{}", "Topics to review:".bold());
    for topic in &topics {
        println!("{} {}", "▸".cyan(), topic.topic.bold());
        println!("    {}", topic.importance);
    }

    Ok(())
}

/// Splits a quiz into the questions that can be asked, with their original
/// indices, and the indices of those that cannot
fn answerable_questions(quiz: &Quiz) -> (Vec<(usize, &Question)>, Vec<usize>) {
    let mut answerable = Vec::new();
    let mut skipped = Vec::new();
    for (index, question) in quiz.questions.iter().enumerate() {
        if question.is_answerable() {
            answerable.push((index, question));
        } else {
            skipped.push(index);
        }
    }
    (answerable, skipped)
}

/// Parses a one-based answer number into a zero-based index
fn parse_choice(input: &str, answers: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    (1..=answers).contains(&choice).then(|| choice - 1)
}

fn score_percent(total: usize, wrong: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (total - wrong) as f64 * 100.0 / total as f64
}

fn print_quiz(quiz: &Quiz, reveal: bool) {
    println!(
        "{}",
        format!("Quiz ({} questions)", quiz.questions.len()).bold()
    );
    println!("{}", "─".repeat(60).dimmed());
    for (index, question) in quiz.questions.iter().enumerate() {
        print_question(index, question, reveal);
        println!();
    }
}

fn print_question(index: usize, question: &Question, reveal: bool) {
    println!("{} {}", format!("{}.", index + 1).cyan(), question.question.bold());
    for (i, answer) in question.answers.iter().enumerate() {
        if reveal && i == question.correct_answer_index {
            println!("   {} {}", format!("{})", i + 1).green(), answer.green());
        } else {
            println!("   {} {}", format!("{})", i + 1).dimmed(), answer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 4), Some(0));
        assert_eq!(parse_choice(" 4\n", 4), Some(3));
        assert_eq!(parse_choice("0", 4), None);
        assert_eq!(parse_choice("5", 4), None);
        assert_eq!(parse_choice("b", 4), None);
    }

    fn question(answers: &[&str], correct: usize) -> Question {
        Question {
            question: "Q".to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            correct_answer_index: correct,
        }
    }

    #[test]
    fn test_questions_without_choices_are_skipped() {
        let quiz = Quiz {
            questions: vec![
                question(&["a", "b"], 1),
                question(&[], 0),
                question(&["a"], 3),
                question(&["x", "y", "z"], 0),
            ],
        };

        let (answerable, skipped) = answerable_questions(&quiz);

        let indices: Vec<usize> = answerable.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(skipped, vec![1, 2]);
        assert_eq!(parse_choice("1", 0), None);
    }

    #[test]
    fn test_score_percent() {
        assert_eq!(score_percent(4, 1), 75.0);
        assert_eq!(score_percent(3, 0), 100.0);
        assert_eq!(score_percent(3, 3), 0.0);
        assert_eq!(score_percent(0, 0), 0.0);
    }
}
