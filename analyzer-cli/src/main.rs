//! # Concert-Pitch Analyzer CLI
//!
//! Interactive driver for the analysis core. Estimates the tuning
//! reference (the frequency of A4) of a recorded performance, either
//! silently in one shot or through a step-by-step wizard that lets the
//! user restrict the estimate to a time range or to specific notes.
//!
//! All algorithmic work lives in `analyzer-core`; this binary only parses
//! arguments, prompts, and formats output.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use analyzer_core::{
    AnalysisParams, NoteAnnotation, ToneSegment, detect_pitch_grid, estimate_a4_annotated,
    estimate_a4_automatic, extract_segments, load_wav, notes,
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("pitch-analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyzes audio files and estimates the frequency of A4")
        .arg(Arg::new("filename").help("Audio file to analyze (WAV)").required(true))
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .action(ArgAction::SetTrue)
                .help("Process the given audio file silently"),
        )
        .arg(
            Arg::new("offset")
                .short('o')
                .long("offset")
                .value_name("SECONDS")
                .default_value("0")
                .help("Offset of the audio to process"),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .value_name("SECONDS")
                .help("Duration of the audio to process"),
        )
        .arg(
            Arg::new("notes")
                .long("notes")
                .value_name("FILE")
                .help("JSON list of note annotations; implies silent annotated mode"),
        )
        .arg(
            Arg::new("params")
                .long("params")
                .value_name("FILE")
                .help("JSON analysis parameter file (defaults match the built-in profile)"),
        )
        .get_matches();

    let filename = PathBuf::from(matches.get_one::<String>("filename").unwrap());
    let offset: f32 = matches
        .get_one::<String>("offset")
        .unwrap()
        .parse()
        .context("offset must be a number of seconds")?;
    let duration: Option<f32> = matches
        .get_one::<String>("duration")
        .map(|d| d.parse().context("duration must be a number of seconds"))
        .transpose()?;

    let mut params = match matches.get_one::<String>("params") {
        Some(path) => load_params(Path::new(path))?,
        None => AnalysisParams::default(),
    };
    params.validate()?;

    if let Some(notes_file) = matches.get_one::<String>("notes") {
        let annotations = load_annotations(Path::new(notes_file))?;
        run_annotated(&filename, offset, duration, &mut params, &annotations)?;
    } else if matches.get_flag("silent") {
        run_silent(&filename, offset, duration, &mut params)?;
    } else {
        run_wizard(&filename, offset, duration, &mut params, &mut std::io::stdin().lock())?;
    }

    Ok(())
}

fn load_params(path: &Path) -> Result<AnalysisParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read parameter file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("cannot parse parameter file {}", path.display()))
}

fn load_annotations(path: &Path) -> Result<Vec<NoteAnnotation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read annotation file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("cannot parse annotation file {}", path.display()))
}

/// Loads the requested audio window and extracts its tone segments.
fn analyze(
    filename: &Path,
    offset: f32,
    duration: Option<f32>,
    params: &mut AnalysisParams,
) -> Result<Vec<ToneSegment>> {
    let audio = load_wav(filename, offset, duration)?;
    // The detector runs at the file's native rate.
    *params = params.with_sample_rate(audio.sample_rate);
    let grid = detect_pitch_grid(&audio.samples, params);
    Ok(extract_segments(&grid, params, params.max_freq))
}

fn run_silent(
    filename: &Path,
    offset: f32,
    duration: Option<f32>,
    params: &mut AnalysisParams,
) -> Result<()> {
    let segments = analyze(filename, offset, duration, params)?;
    let estimate = estimate_a4_automatic(&segments)?;
    println!("Estimated frequency of A4 is {:.1} Hz", estimate.a4);
    Ok(())
}

fn run_annotated(
    filename: &Path,
    offset: f32,
    duration: Option<f32>,
    params: &mut AnalysisParams,
    annotations: &[NoteAnnotation],
) -> Result<()> {
    let segments = analyze(filename, offset, duration, params)?;
    let batch = estimate_a4_annotated(&segments, annotations);
    print_batch(&batch);
    Ok(())
}

fn print_batch(batch: &analyzer_core::EstimateBatch) {
    for skipped in &batch.skipped {
        println!(
            "Warning: note `{}` skipped ({})",
            skipped.annotation.note, skipped.reason
        );
    }

    if batch.estimates.is_empty() {
        println!("No annotation produced an estimate.");
        return;
    }

    println!("The estimated frequencies of A4 from each note are:");
    for estimate in &batch.estimates {
        println!(
            "\t{}: {:.1} Hz ({} samples)",
            estimate.note.as_deref().unwrap_or("-"),
            estimate.a4,
            estimate.sample_count
        );
    }
    // Statistics are defined here: the batch is nonempty.
    println!(
        "Average estimated frequency: {:.1} Hz, median frequency: {:.1} Hz, standard deviation: {:.1} Hz.",
        batch.mean().unwrap(),
        batch.median().unwrap(),
        batch.std_dev().unwrap()
    );
}

fn print_segments(segments: &[ToneSegment]) {
    println!("Extracted {} tone segments:", segments.len());
    println!("{:>4}  {:>8}  {:>8}  {:>9}  note", "#", "start", "end", "mean Hz");
    for (i, segment) in segments.iter().enumerate() {
        let mean = segment.mean_frequency();
        println!(
            "{:>4}  {:>8.3}  {:>8.3}  {:>9.2}  {}",
            i,
            segment.start_time(),
            segment.end_time(),
            mean,
            notes::hz_to_note(mean)
        );
    }
}

fn run_wizard(
    filename: &Path,
    offset: f32,
    duration: Option<f32>,
    params: &mut AnalysisParams,
    input: &mut impl BufRead,
) -> Result<()> {
    println!("Welcome to the concert pitch analyzer!\n");
    println!("Please follow the instructions to get the result:");
    println!(
        "[1] The selected audio window will be analyzed and its tone segments listed.\n\
         This may take several seconds, please wait.\n"
    );

    let segments = analyze(filename, offset, duration, params)?;
    print_segments(&segments);

    println!(
        "\n[2] Each segment is a span of frames where one frequency bin kept reporting\n\
         a pitch. Use the start/end times and note names above to decide what to\n\
         analyze."
    );

    println!(
        "\n[3] Decide whether the data is suitable for analyzing.\n\
         If not, re-run the program with a different offset, duration or file."
    );
    if !prompt_yes_no(input, "Process current data? (y/n) ")? {
        return Ok(());
    }

    println!(
        "\n[4] Select how to estimate:\n\
         \t1. Give a start and end time and analyze automatically.\n\
         \t2. [Pro] Give notes and their sustaining time for a more specific result."
    );
    let mode = prompt_choice(input, "Select mode: (1/2) ", &["1", "2"])?;

    if mode == "1" {
        println!("\n[5] Enter the start and end time of the range to analyze:");
        loop {
            let start = prompt_f32(input, "start time: ")?;
            let end = prompt_f32(input, "end time: ")?;
            if end <= start {
                println!("End time must be after start time.");
                continue;
            }

            match analyze(filename, offset + start, Some(end - start), params)
                .and_then(|segs| estimate_a4_automatic(&segs).map_err(Into::into))
            {
                Ok(estimate) => {
                    println!("Estimated frequency of A4 is {:.1} Hz", estimate.a4)
                }
                Err(err) => println!("Estimation failed: {}", err),
            }

            if !prompt_yes_no(input, "Re-estimate using another range? (y/n) ")? {
                break;
            }
        }
    } else {
        println!(
            "\n[5] Add each note with its start and end time, one per line.\n\
             \tFormat: NOTENAME STARTTIME ENDTIME    (e.g. \"A4 1.2 2\")\n\
             Enter `q` to stop adding."
        );
        loop {
            let annotations = read_annotations(input)?;
            let batch = estimate_a4_annotated(&segments, &annotations);
            print_batch(&batch);

            if !prompt_yes_no(input, "Re-estimate using different notes? (y/n) ")? {
                break;
            }
        }
    }

    println!();
    Ok(())
}

/// Reads `NOTE START END` lines until the user enters `q`.
fn read_annotations(input: &mut impl BufRead) -> Result<Vec<NoteAnnotation>> {
    let mut annotations = Vec::new();
    loop {
        let line = prompt(input, "+ ")?;
        if line.eq_ignore_ascii_case("q") {
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let parsed = match fields.as_slice() {
            [note, start, end] => match (start.parse::<f32>(), end.parse::<f32>()) {
                (Ok(start), Ok(end)) => Some(NoteAnnotation {
                    note: (*note).to_string(),
                    start,
                    end,
                }),
                _ => None,
            },
            _ => None,
        };
        match parsed {
            Some(annotation) => annotations.push(annotation),
            None => println!("Expected: NOTENAME STARTTIME ENDTIME (e.g. \"A4 1.2 2\")"),
        }
    }
    Ok(annotations)
}

/// Reads one line of input. A zero-byte read means the input stream is
/// closed (Ctrl-D or an exhausted pipe); the wizard cannot continue then,
/// so it is an error rather than an empty answer.
fn prompt(input: &mut impl BufRead, message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("input ended before the wizard finished");
    }
    Ok(line.trim().to_string())
}

fn prompt_yes_no(input: &mut impl BufRead, message: &str) -> Result<bool> {
    Ok(prompt_choice(input, message, &["y", "n"])? == "y")
}

fn prompt_choice(input: &mut impl BufRead, message: &str, choices: &[&str]) -> Result<String> {
    loop {
        let answer = prompt(input, message)?.to_lowercase();
        if choices.contains(&answer.as_str()) {
            return Ok(answer);
        }
    }
}

fn prompt_f32(input: &mut impl BufRead, message: &str) -> Result<f32> {
    loop {
        match prompt(input, message)?.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Please enter a number."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_errors_on_closed_input() {
        let mut input = Cursor::new("");
        assert!(prompt(&mut input, "? ").is_err());
    }

    #[test]
    fn choice_retries_then_errors_on_closed_input() {
        // Two invalid answers, then the stream ends: the loop must
        // terminate with an error instead of spinning.
        let mut input = Cursor::new("maybe\nx\n");
        assert!(prompt_choice(&mut input, "(y/n) ", &["y", "n"]).is_err());
    }

    #[test]
    fn choice_accepts_a_valid_answer() {
        let mut input = Cursor::new("nope\nY\n");
        assert_eq!(prompt_choice(&mut input, "(y/n) ", &["y", "n"]).unwrap(), "y");
    }

    #[test]
    fn f32_prompt_errors_on_closed_input() {
        let mut input = Cursor::new("not-a-number\n");
        assert!(prompt_f32(&mut input, "start time: ").is_err());
    }

    #[test]
    fn annotations_stop_at_q() {
        let mut input = Cursor::new("A4 1.2 2\nbogus line\nBb3 0 1\nq\n");
        let annotations = read_annotations(&mut input).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].note, "A4");
        assert_eq!(annotations[1].start, 0.0);
    }

    #[test]
    fn annotations_error_on_closed_input() {
        let mut input = Cursor::new("A4 1.2 2\n");
        assert!(read_annotations(&mut input).is_err());
    }
}
