//! Renders the feed page against a live backend and prints the resulting HTML.
//!
//! Examples:
//!   feedview-snapshot
//!   feedview-snapshot --tag rust
//!   feedview-snapshot --base-url http://localhost:8080 --escape
//!
//! Defaults come from `FEEDVIEW_BASE_URL` / `FEEDVIEW_ESCAPE_MARKUP`, or from
//! a JSON file given with `--config`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;
    use std::process;
    use std::rc::Rc;

    use feedview::memory::{MemoryHost, MemoryRegion};
    use feedview::{Api, ClientConfig, FeedPage, FeedView, HttpTransport, ViewConfig};

    struct Args {
        config: ViewConfig,
        tag: Option<String>,
    }

    fn usage() -> ! {
        eprintln!("feedview-snapshot (renders the feed page to stdout)");
        eprintln!("Usage: feedview-snapshot [options]\n");
        eprintln!("Options:");
        eprintln!("  --config <file.json>    Load settings from a JSON file");
        eprintln!("  --base-url <url>        Backend origin (default http://127.0.0.1:42096)");
        eprintln!("  --tag <tag>             Render the tag-filtered feed");
        eprintln!("  --escape                Escape backend text instead of inserting markup");
        process::exit(1);
    }

    fn parse_args() -> Args {
        let args: Vec<String> = std::env::args().skip(1).collect();

        let mut config = None;
        let mut base_url = None;
        let mut tag = None;
        let mut escape = false;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "--base-url" | "--tag" => {
                    let Some(value) = args.get(i + 1).cloned() else {
                        usage();
                    };
                    match args[i].as_str() {
                        "--config" => config = Some(value),
                        "--base-url" => base_url = Some(value),
                        _ => tag = Some(value),
                    }
                    i += 2;
                }
                "--escape" => {
                    escape = true;
                    i += 1;
                }
                "-h" | "--help" => usage(),
                other => {
                    eprintln!("Unknown argument: {other}");
                    usage();
                }
            }
        }

        let mut config = match config {
            Some(path) => ViewConfig::from_json_file(Path::new(&path)).unwrap_or_else(|e| {
                eprintln!("{e}");
                process::exit(1);
            }),
            None => ViewConfig::from_env(),
        };
        if let Some(url) = base_url {
            config.client = ClientConfig::new(url);
        }
        if escape {
            config.render.escape_markup = true;
        }
        Args { config, tag }
    }

    pub fn run() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();

        let args = parse_args();
        tracing::info!(base_url = %args.config.client.base_url, tag = ?args.tag, "rendering feed");

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("failed to start runtime: {e}");
                process::exit(1);
            }
        };

        let host = match &args.tag {
            Some(tag) => MemoryHost::with_query(&format!("tag={}", urlencoding::encode(tag))),
            None => MemoryHost::new(),
        };
        let api = Api::new(Rc::new(HttpTransport::new(&args.config.client)));
        let view = FeedView::new(api, host, args.config.render);

        let auth_links = MemoryRegion::new();
        let banner = MemoryRegion::new();
        let feed = MemoryRegion::new();
        let page = FeedPage {
            auth_links: auth_links.clone(),
            composer: None,
            banner: banner.clone(),
            feed: feed.clone(),
        };

        let local = tokio::task::LocalSet::new();
        local.spawn_local(async move { view.start(page).await });
        runtime.block_on(local);

        println!("<div id=\"authLinks\">{}</div>", auth_links.html());
        println!("<div id=\"tagFilter\">{}</div>", banner.html());
        println!("<div id=\"feed\">{}</div>", feed.html());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}
