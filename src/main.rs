//! Tile Mosaic - photo mosaic server and one-shot renderer.
//!
//! This binary indexes the tile directory, then either starts the HTTP server
//! or renders a single mosaic to a file.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_mosaic::{
    config::{Cli, Command, RenderConfig, ServeConfig},
    create_router, FsTileSource, MosaicAssembler, MosaicEncoder, MosaicError, MosaicService,
    OutputFormat, RouterConfig, TileCache, TileIndex,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Render(config) => run_render(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Tiles: {}", config.tiles_dir.display());
    match &config.static_dir {
        Some(dir) => info!("  Static files: {}", dir.display()),
        None => info!("  Static files: disabled"),
    }
    info!(
        "  JPEG quality: {}, default tile size: {}px",
        config.jpeg_quality, config.default_tile_size
    );
    info!(
        "  Tile cache: {} bytes, upload limit: {} bytes",
        config.cache_tiles, config.max_upload_bytes
    );

    let index = match build_index(&config.tiles_dir, config.allow_empty_index).await {
        Ok(index) => index,
        Err(e) => {
            error!("Failed to index tiles: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = MosaicService::with_cache_capacity(Arc::new(index), config.cache_tiles)
        .with_encoder(MosaicEncoder::jpeg(config.jpeg_quality));

    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the upload form:");
    info!("    open http://{}/", addr);
    info!("  Check health:");
    info!("    curl http://{}/health", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_default_tile_size(config.default_tile_size)
        .with_tracing(!config.no_tracing);

    if let Some(dir) = &config.static_dir {
        router_config = router_config.with_static_dir(dir);
    }

    router_config
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match render(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn render(config: RenderConfig) -> Result<(), MosaicError> {
    let index = build_index(&config.tiles_dir, true).await?;

    let format = OutputFormat::from_path(&config.output);
    let assembler = MosaicAssembler::new(Arc::clone(index.source()), Arc::new(TileCache::new()))
        .with_encoder(MosaicEncoder::with_format(format, config.jpeg_quality));

    let source_path = config.source.clone();
    let image = tokio::task::spawn_blocking(move || {
        image::open(&source_path)
            .map(|image| image.into_rgba8())
            .map_err(|e| MosaicError::decode(source_path.display(), e))
    })
    .await??;

    let snapshot = Arc::new(index.snapshot());
    let output = assembler
        .assemble(Arc::new(image), config.tile_size, snapshot)
        .await?;

    tokio::fs::write(&config.output, &output.data)
        .await
        .map_err(|e| MosaicError::io(config.output.display(), e))?;

    println!("Wrote {}", config.output.display());
    println!("  Size: {}x{} px", output.width, output.height);
    println!("  Tile size: {} px", output.tile_size);
    println!(
        "  Cells: {} drawn, {} blank",
        output.stats.cells_drawn,
        output.stats.cells_unmatched + output.stats.cells_failed
    );
    println!("  Time: {:.2?}", output.elapsed);

    Ok(())
}

// =============================================================================
// Shared Setup
// =============================================================================

/// Scan the tile directory on a blocking worker.
async fn build_index(
    tiles_dir: &std::path::Path,
    allow_empty: bool,
) -> Result<TileIndex, MosaicError> {
    let source = Arc::new(FsTileSource::new(tiles_dir));
    let index = tokio::task::spawn_blocking(move || TileIndex::build(source)).await??;

    if index.is_empty() {
        if !allow_empty {
            return Err(MosaicError::EmptyTileIndex {
                source_name: tiles_dir.display().to_string(),
            });
        }
        warn!(
            "No usable tiles in {}; every mosaic will be blank",
            tiles_dir.display()
        );
    } else {
        info!("Indexed {} tile(s)", index.len());
    }

    Ok(index)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_mosaic=debug,tower_http=debug"
    } else {
        "tile_mosaic=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
