//! Batch-parallel patch path.
//!
//! # Design
//!
//! The change list is cut into batches and each batch owns the original
//! window from its first change up to the next batch's first change. A
//! fixed pool of scoped worker threads pulls batch jobs from a bounded
//! queue; every job carries its own single-slot reply channel.
//!
//! The calling thread acts as supervisor. It seeds the queue with one job
//! per worker, then receives the replies strictly in batch order, appending
//! each patched window to a temporary file and queueing the next pending
//! job only after a reply has been written. At most `workers` patched
//! windows are therefore alive at any moment, however many batches there
//! are. Dropping a reply sender, for example when a worker panics, surfaces
//! as an error instead of a hang.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use logging::trace_patch;
use tempfile::NamedTempFile;

use super::plan::{BatchWindow, Span, batch_windows, splice_window, to_usize};
use super::sequential::parent_dir;
use super::{CancellationToken, PatchMode, PatchReport};
use crate::change::Change;

type Reply = io::Result<Vec<u8>>;

struct Job<'a> {
    window: BatchWindow<'a>,
    reply: Sender<Reply>,
}

/// Rewrites `path` with `changes` applied by up to `max_workers` threads.
pub(super) fn apply(
    path: &Path,
    changes: &[Change],
    span: Span,
    original_len: u64,
    batch_size: usize,
    max_workers: usize,
    cancel: &CancellationToken,
) -> io::Result<PatchReport> {
    let windows = batch_windows(changes, batch_size, span);
    let batches = windows.len();
    let workers = max_workers.clamp(1, batches.max(1));
    trace_patch!(
        changes = changes.len(),
        batches,
        workers,
        "concurrent patch started"
    );

    let mut source = File::open(path)?;
    let permissions = source.metadata()?.permissions();
    let mut writer = BufWriter::new(NamedTempFile::new_in(parent_dir(path))?);
    io::copy(&mut (&mut source).take(span.start), &mut writer)?;

    let (replies, mut jobs): (Vec<Receiver<Reply>>, Vec<Job<'_>>) = windows
        .into_iter()
        .map(|window| {
            let (reply, receiver) = bounded(1);
            (receiver, Job { window, reply })
        })
        .unzip();
    // Popped from the back, so reverse to submit in batch order.
    jobs.reverse();

    let stop = AtomicBool::new(false);
    let supervised = thread::scope(|scope| {
        let (job_tx, job_rx) = bounded::<Job<'_>>(workers);
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let stop = &stop;
            scope.spawn(move || work(path, &job_rx, stop, cancel));
        }
        drop(job_rx);

        let result = supervise(&mut writer, &replies, &mut jobs, &job_tx, workers, cancel);
        if result.is_err() {
            stop.store(true, Ordering::Release);
        }
        drop(job_tx);
        result
    });
    supervised?;

    source.seek(SeekFrom::Start(span.end))?;
    io::copy(&mut source, &mut writer)?;

    let temp = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    let patched_len = temp.as_file().metadata()?.len();
    cancel.check()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path)?;

    trace_patch!(batches, patched_len, "concurrent patch finished");
    Ok(PatchReport {
        mode: PatchMode::Concurrent,
        changes: changes.len(),
        batches,
        original_len,
        patched_len,
    })
}

fn supervise<'a, W: Write>(
    writer: &mut W,
    replies: &[Receiver<Reply>],
    pending: &mut Vec<Job<'a>>,
    job_tx: &Sender<Job<'a>>,
    workers: usize,
    cancel: &CancellationToken,
) -> io::Result<()> {
    for _ in 0..workers {
        submit(pending, job_tx)?;
    }
    for (index, reply) in replies.iter().enumerate() {
        cancel.check()?;
        let patched = reply.recv().map_err(|_| {
            io::Error::other(format!("worker for batch {index} exited without replying"))
        })??;
        writer.write_all(&patched)?;
        drop(patched);
        submit(pending, job_tx)?;
    }
    Ok(())
}

fn submit<'a>(pending: &mut Vec<Job<'a>>, job_tx: &Sender<Job<'a>>) -> io::Result<()> {
    match pending.pop() {
        Some(job) => job_tx
            .send(job)
            .map_err(|_| io::Error::other("patch workers exited early")),
        None => Ok(()),
    }
}

fn work(path: &Path, jobs: &Receiver<Job<'_>>, stop: &AtomicBool, cancel: &CancellationToken) {
    let mut file = File::open(path);
    for job in jobs {
        let result = if stop.load(Ordering::Acquire) {
            Err(io::Error::other("patch aborted"))
        } else if let Err(error) = cancel.check() {
            Err(error)
        } else {
            match file.as_mut() {
                Ok(file) => patch_window(file, &job.window),
                Err(error) => Err(io::Error::new(error.kind(), error.to_string())),
            }
        };
        // The supervisor may already have given up on this batch.
        let _ = job.reply.send(result);
    }
}

fn patch_window(file: &mut File, window: &BatchWindow<'_>) -> Reply {
    let read_and_splice = |file: &mut File| -> Reply {
        let mut bytes = vec![0u8; to_usize(window.end - window.start)?];
        file.seek(SeekFrom::Start(window.start))?;
        file.read_exact(&mut bytes)?;
        splice_window(&bytes, window.start, window.changes)
    };
    read_and_splice(file).map_err(|error| {
        io::Error::new(
            error.kind(),
            format!(
                "batch {} (bytes {}..{}): {error}",
                window.index, window.start, window.end
            ),
        )
    })
}
