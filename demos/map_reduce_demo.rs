//! Word-count over a text file, driven by the LATE scheduler: splits the file into
//! byte-range chunks, runs them as map tasks across a handful of nodes with randomized
//! speed factors, then reduces locally and writes the merged counts to disk.
//!
//! Not part of the library: this binary shows one way to use [`late_scheduler::Scheduler`]
//! end to end, mirroring the CLI the speculative-execution prototype it's named after
//! shipped for its own map/reduce demo.
//!
//! ```text
//! map_reduce_demo <input-file> <num-nodes> <num-tasks>
//! ```

use anyhow::{bail, Context, Result};
use late_scheduler::{NodeId, Scheduler, SchedulerConfig, TaskId};
use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::time::Duration;

fn generate_speed_factor() -> f64 {
    rand::thread_rng().gen_range(0.5..1.5)
}

fn split_input(content: &str, num_tasks: usize) -> Vec<Vec<u8>> {
    let bytes = content.as_bytes();
    let chunk_size = bytes.len() / num_tasks.max(1);
    (0..num_tasks)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 == num_tasks { bytes.len() } else { start + chunk_size };
            bytes[start..end].to_vec()
        })
        .collect()
}

fn word_count(content: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for raw in content.split_whitespace() {
        let word: String = raw.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        let word = word.to_lowercase();
        if !word.is_empty() {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    counts
}

fn print_progress(done: usize, total: usize, phase: &str) {
    let width = 50;
    let progress = if total == 0 { 1.0 } else { done as f64 / total as f64 };
    let pos = (width as f64 * progress) as usize;
    let bar: String = (0..width)
        .map(|i| if i < pos { '=' } else if i == pos { '>' } else { ' ' })
        .collect();
    print!("\r{phase} progress: [{bar}] {:>3}% ({done}/{total})", (progress * 100.0) as u32);
    let _ = std::io::stdout().flush();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        bail!("usage: {} <input-file> <num-nodes> <num-tasks>", args[0]);
    }
    let input_path = &args[1];
    let num_nodes: usize = args[2].parse().context("num-nodes must be an integer")?;
    let num_tasks: usize = args[3].parse().context("num-tasks must be an integer")?;
    if num_nodes == 0 || num_tasks == 0 {
        bail!("num-nodes and num-tasks must both be positive");
    }

    let content = fs::read_to_string(input_path)
        .with_context(|| format!("reading input file {input_path}"))?;

    let scheduler = Scheduler::new(SchedulerConfig::default())?;

    let mut node_speeds = Vec::with_capacity(num_nodes);
    for i in 0..num_nodes {
        let speed = generate_speed_factor();
        node_speeds.push(speed);
        scheduler.add_node(NodeId(i as u64), speed)?;
    }

    for (i, chunk) in split_input(&content, num_tasks).into_iter().enumerate() {
        scheduler.add_task(TaskId(i as u64), chunk);
    }

    scheduler.start()?;

    println!("MAP PHASE");
    loop {
        let stats = scheduler.stats();
        print_progress(stats.tasks_completed, stats.total_tasks.max(num_tasks), "Map");
        if stats.tasks_completed >= num_tasks && stats.total_tasks > 0 {
            println!();
            break;
        }
        std::thread::sleep(Duration::from_millis(200));
    }
    scheduler.join()?;

    println!("\nREDUCE PHASE");
    let reduce_steps = 10;
    for i in 0..=reduce_steps {
        print_progress(i, reduce_steps, "Reduce");
        std::thread::sleep(Duration::from_millis(50));
    }
    println!();

    let counts = word_count(&content);
    let mut sorted: Vec<(&String, &usize)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));

    fs::create_dir_all("results").context("creating results directory")?;
    let out_path = "results/output.txt";
    let mut out = fs::File::create(out_path).context("creating output file")?;
    for (word, count) in &sorted {
        writeln!(out, "{word}: {count}")?;
    }

    let stats = scheduler.stats();
    println!("\n=== Scheduler summary ===");
    println!("Total tasks: {}", stats.total_tasks);
    println!("Completed: {}", stats.tasks_completed);
    println!("Speculative tasks: {}", stats.speculative_tasks);
    println!("Stragglers detected: {}", stats.stragglers_detected);

    println!("\n=== Node speed factors ===");
    for (i, speed) in node_speeds.iter().enumerate() {
        println!("Node {i}: {speed:.3}");
    }

    println!("\n=== Task durations ===");
    let mut durations: Vec<(&u64, &f64)> = stats.task_durations.iter().collect();
    durations.sort_by_key(|(id, _)| **id);
    for (id, duration) in durations {
        let marker = if *id >= TaskId::SPECULATIVE_ID_OFFSET { " (speculative)" } else { "" };
        println!("Task {id:>5}: {duration:.3}s{marker}");
    }

    println!("\n=== Output ===");
    println!("Word count completed. Output written to {out_path}");
    println!("Found {} unique words", counts.len());
    println!(
        "LATE scheduler threshold: speculative execution for slowest {}% of tasks",
        (stats.straggler_percentile * 100.0) as u32
    );

    Ok(())
}
