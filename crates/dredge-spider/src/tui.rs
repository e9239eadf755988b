use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bars for a bulk fetch: one bar tracking the total number of
/// URLs, one tracking successes, one tracking skips/failures. All three are
/// hidden when `tui` is off so callers can tick them unconditionally.
pub(crate) struct FanoutBars {
    _multi: Option<MultiProgress>,
    pub total: ProgressBar,
    pub done: ProgressBar,
    pub skipped: ProgressBar,
}

pub(crate) fn fanout_bars(len: usize, tui: bool) -> anyhow::Result<FanoutBars> {
    if !tui {
        return Ok(FanoutBars {
            _multi: None,
            total: ProgressBar::hidden(),
            done: ProgressBar::hidden(),
            skipped: ProgressBar::hidden(),
        });
    }

    let multi = MultiProgress::new();

    let total = multi.add(
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.magenta}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, Rate: {per_sec}, ETA: {eta}]",
                )?
                .progress_chars("## "),
        ),
    );
    total.set_message("total");
    total.enable_steady_tick(Duration::from_millis(100));

    let done = multi.insert_after(
        &total,
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(" {msg:>9.green} |{bar:57.green}| {pos:<2.green}")?
                .progress_chars("## "),
        ),
    );
    done.set_message("fetched");

    let skipped = multi.insert_after(
        &done,
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::default_bar()
                .template(" {msg:>9.red} |{bar:57.red}| {pos:<2.red}")?
                .progress_chars("## "),
        ),
    );
    skipped.set_message("skipped");

    Ok(FanoutBars {
        _multi: Some(multi),
        total,
        done,
        skipped,
    })
}
