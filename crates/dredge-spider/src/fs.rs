use crate::http::*;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, trace, warn};

const CHUNK_SIZE: u64 = 100 * 1024 * 1024; // 100 MB

const RETRIES: u32 = 3;

/// Outcome of a retried fetch; `Gone` covers responses that will never
/// succeed on a retry (the SDR endpoints return 404 for weekend dates and
/// 403 for dates outside the published window).
pub enum Fetched {
    Body(Vec<u8>),
    Gone,
}

/// GET `url` with a fixed number of retries and exponential sleep between
/// attempts. Only 403 and 404 are treated as permanent and reported as
/// [`Fetched::Gone`]; everything else, including the SEC's 429 throttling,
/// retries until exhausted.
pub async fn fetch_with_retry(
    http_client: &HttpClient,
    url: &str,
) -> anyhow::Result<Fetched> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match http_client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(Fetched::Body(response.bytes().await?.to_vec()));
                }
                if matches!(status, StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) {
                    debug!("{url} returned {status}, not retrying");
                    return Ok(Fetched::Gone);
                }
                warn!("{url} returned {status}, attempt {attempt}/{RETRIES}");
            }
            Err(err) => {
                warn!("failed to fetch {url}, attempt {attempt}/{RETRIES}, error({err})");
            }
        }

        if attempt >= RETRIES {
            return Err(anyhow::anyhow!("gave up on {url} after {RETRIES} attempts"));
        }
        tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
    }
}

/// One URL to fetch and the file it lands in.
pub struct FetchJob {
    pub url: String,
    pub path: std::path::PathBuf,
}

/// Fan a batch of small independent fetches out over the tokio runtime,
/// bounded by the CPU count. Jobs already recorded in the filelist are
/// skipped; permanent 4xx responses (unpublished dates) are skipped at
/// debug level; everything fetched is appended to the filelist.
pub async fn bulk_fetch(
    http_client: &HttpClient,
    filelist: &crate::filelist::Filelist,
    jobs: Vec<FetchJob>,
    tui: bool,
) -> anyhow::Result<()> {
    use futures::{stream, StreamExt};

    let bars = crate::tui::fanout_bars(jobs.len(), tui)?;

    stream::iter(jobs)
        .for_each_concurrent(num_cpus::get(), |job| {
            let bars = &bars;
            async move {
                let path = job.path.to_string_lossy().to_string();

                if filelist.is_complete(&job.url) {
                    trace!("{url} already downloaded, skipping", url = job.url);
                    bars.total.inc(1);
                    bars.done.inc(1);
                    return;
                }

                match fetch_with_retry(http_client, &job.url).await {
                    Ok(Fetched::Body(body)) => {
                        let size = body.len() as u64;
                        if let Err(err) = tokio::fs::write(&job.path, body).await {
                            error!("failed to write {path}, error({err})");
                            bars.skipped.inc(1);
                        } else {
                            if let Err(err) = filelist.record(&job.url, &path, size) {
                                error!(
                                    "failed to record {url} in filelist, error({err})",
                                    url = job.url
                                );
                            }
                            bars.done.inc(1);
                        }
                    }
                    Ok(Fetched::Gone) => {
                        debug!("nothing published at {url}, skipping", url = job.url);
                        bars.skipped.inc(1);
                    }
                    Err(err) => {
                        error!("failed to fetch {url}, error({err})", url = job.url);
                        bars.skipped.inc(1);
                    }
                }
                bars.total.inc(1);
            }
        })
        .await;

    bars.total.finish_and_clear();
    Ok(())
}

/// GET request a file from `url` and write it to `path`, splitting the body
/// into ranged chunks downloaded across tokio tasks. Servers that do not
/// advertise a `Content-Length` fall back to a single unranged GET.
///
/// Returns the number of bytes written.
pub async fn download_file(
    http_client: &HttpClient,
    url: &str,
    path: &str,
    tui: bool,
) -> anyhow::Result<u64> {
    use reqwest::header::CONTENT_LENGTH;

    let client = http_client.clone();

    // probe the size from the response headers
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "GET {url} returned {status}",
            status = response.status()
        ));
    }
    let file_size = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|len| len.to_str().ok())
        .and_then(|len| len.parse::<u64>().ok())
        .unwrap_or(0);

    // ensure the directory exists
    trace!("checking directory path: {:?}", path);
    let dir_path = std::path::Path::new(path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("failed to get directory path"))?;
    tokio::fs::create_dir_all(dir_path).await?;

    // unknown length: take the body we already have
    if file_size == 0 {
        let body = response.bytes().await?;
        tokio::fs::write(path, &body).await?;
        debug!("downloaded {url} to {path} ({} bytes, unranged)", body.len());
        return Ok(body.len() as u64);
    }

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(file_size).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {bytes}/{total_bytes} \
                    [Rate: {bytes_per_sec:.magenta}, ETA: {eta:.blue}]",
                )?
                .progress_chars("##-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    // fan each ranged chunk out as its own task, all writing into one file
    let file = File::create(path).await?;
    let file = Arc::new(Mutex::new(file));
    let num_chunks = (file_size + CHUNK_SIZE - 1) / CHUNK_SIZE;
    let mut tasks = Vec::with_capacity(num_chunks as usize);

    pb.set_message(format!("downloading {url} ..."));
    for i in 0..num_chunks {
        let start = i * CHUNK_SIZE;
        let end = std::cmp::min((i + 1) * CHUNK_SIZE, file_size);
        let url = url.to_string();
        let file = file.clone();
        let client = client.clone();
        let pb = pb.clone();
        tasks.push(tokio::spawn(async move {
            match download_chunk(&client, &url, start, end, &file).await {
                Ok(_) => {
                    pb.inc(end - start);
                    Ok(())
                }
                Err(err) => {
                    error!("failed to download chunk {start}-{end} of {url}, error({err})");
                    Err(err)
                }
            }
        }));
    }

    for task in tasks {
        task.await??;
    }

    pb.finish_and_clear();
    debug!("downloaded {url} to {path} ({file_size} bytes)");

    Ok(file_size)
}

/// Download a range of bytes (a chunk) with a GET request and write it at
/// its offset in `output_file`.
async fn download_chunk(
    http_client: &HttpClient,
    url: &str,
    start: u64,
    end: u64,
    output_file: &Arc<Mutex<File>>,
) -> anyhow::Result<()> {
    let range = format!("bytes={}-{}", start, end - 1);

    let response = http_client
        .get(url)
        .header(reqwest::header::RANGE, range)
        .send()
        .await?;

    // servers that ignore the Range header send the whole body as 200;
    // only accept that for the first chunk
    let body = match response.status() {
        reqwest::StatusCode::PARTIAL_CONTENT => response.bytes().await?,
        reqwest::StatusCode::OK if start == 0 => response.bytes().await?,
        status => {
            return Err(anyhow::anyhow!(
                "expected 206 Partial Content for {url}, got {status}"
            ))
        }
    };

    let mut file = output_file.lock().await;
    file.seek(tokio::io::SeekFrom::Start(start)).await?;
    file.write_all(&body).await?;

    Ok(())
}

/// Unzip a `.zip` file (`zip_file`) to a target directory (`to_dir`),
/// extracting members in parallel with [`rayon`].
///
/// [`rayon`]: https://docs.rs/rayon/latest/rayon/
pub async fn unzip(zip_file: &str, to_dir: &str, tui: bool) -> anyhow::Result<()> {
    debug!("unzipping {zip_file} to {to_dir}");

    let file = std::fs::File::open(zip_file)?;
    let archive = zip::ZipArchive::new(file).map_err(|err| {
        error!("failed to open zip file at {}, {}", zip_file, err);
        err
    })?;
    let zip_length = archive.len();
    let archive = Arc::new(std::sync::Mutex::new(archive));

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(zip_length as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} files \
                    [Rate: {per_sec:.magenta}, ETA: {eta:.blue}]",
                )?
                .progress_chars("##-"),
        );
        pb.set_message("unzipping file ...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    tokio::fs::create_dir_all(to_dir).await?;

    // parallel iteration across zipped files
    (0..zip_length).into_par_iter().try_for_each(|i| {
        let archive = archive.clone();
        let mut archive = archive.lock().expect("unlock zip archive");
        let mut file = archive.by_index(i)?;
        let outpath = format!("{to_dir}/{}", file.mangled_name().display());
        let outdir = std::path::Path::new(&outpath)
            .parent()
            .ok_or_else(|| anyhow::anyhow!("no parent directory for {outpath}"))?;

        if !outdir.exists() {
            std::fs::create_dir_all(outdir)?;
        }

        let mut outfile = std::fs::File::create(&outpath)?;
        trace!("copying {} to {}", file.name(), outpath);
        std::io::copy(&mut file, &mut outfile)?;
        pb.inc(1);
        Ok::<(), anyhow::Error>(())
    })?;

    pb.finish_and_clear();
    debug!("{zip_file} unzipped to {to_dir}");

    Ok(())
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOT_FOUND: &str =
        "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const THROTTLED: &str =
        "HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const OK: &str = "HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbody";

    /// Loopback server answering one canned response per connection,
    /// counting the connections it sees.
    fn serve(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        std::thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{addr}"), hits)
    }

    #[tokio::test]
    async fn not_found_is_permanent_and_not_retried() {
        let (url, hits) = serve(vec![NOT_FOUND]);
        let client = HttpClient::new();
        match fetch_with_retry(&client, &url).await.unwrap() {
            Fetched::Gone => {}
            Fetched::Body(_) => panic!("expected a permanent skip"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn throttling_retries_until_the_body_arrives() {
        let (url, hits) = serve(vec![THROTTLED, OK]);
        let client = HttpClient::new();
        match fetch_with_retry(&client, &url).await.unwrap() {
            Fetched::Body(body) => assert_eq!(body, b"body"),
            Fetched::Gone => panic!("429 must not be classified as permanent"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
