use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

use crate::cli::Cli;
use crate::clip::{clip_layer, ClipSummary};
use crate::fetch::Fetcher;
use crate::prompt::collect_request;
use crate::region::{Boundary, BoundaryBuilder, BoundaryRequest};
use crate::source::{NationalLayer, Project, TigerSource};

/// Layers clipped to the boundary, in order.
pub const CLIP_TARGETS: [NationalLayer; 2] = [NationalLayer::Roads, NationalLayer::Counties];

/// Result of clipping one target layer.
#[derive(Debug)]
pub struct LayerOutcome {
    pub layer: &'static str,
    pub result: Result<ClipSummary>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunReport {
    pub boundary: Boundary,
    pub layers: Vec<LayerOutcome>,
}

/// Fetch, build the boundary, clip. One run per request.
pub struct Pipeline {
    project: Project,
    source: TigerSource,
}

impl Pipeline {
    pub fn new(project: Project, source: TigerSource) -> Self { Self { project, source } }

    #[inline] pub fn project(&self) -> &Project { &self.project }

    /// Boundary errors abort the run; a failed layer clip is logged and the next layer still runs.
    pub fn run(&self, request: &BoundaryRequest) -> Result<RunReport> {
        self.project.ensure_dirs()?;
        let fetcher = Fetcher::new(self.project.downloads())?;

        let national = |layer: NationalLayer| -> Result<PathBuf> {
            fetcher.fetch_shapefile(layer.name(), &self.source.national_url(layer))
        };
        let states_shp = national(NationalLayer::States)?;
        let counties_shp = national(NationalLayer::Counties)?;
        let roads_shp = national(NationalLayer::Roads)?;

        info!("Building {} boundary...", request.kind());
        let boundary = BoundaryBuilder::new(&fetcher, &self.source, states_shp, counties_shp.clone())
            .build(request)?;

        info!("Clipping layers to boundary...");
        let layers = CLIP_TARGETS.into_iter()
            .map(|layer| {
                let source_shp = match layer {
                    NationalLayer::Roads => &roads_shp,
                    _ => &counties_shp,
                };
                let result = clip_layer(source_shp, &boundary, &self.project.clipped_output(layer.name()));
                if let Err(e) = &result {
                    error!("Error clipping {}: {e:#}", layer.name());
                }
                LayerOutcome { layer: layer.name(), result }
            })
            .collect();

        Ok(RunReport { boundary, layers })
    }
}

/// Entry point behind the binary: gather input, then run the pipeline.
pub fn run(cli: &Cli) -> Result<RunReport> {
    // bad input fails here, before anything is downloaded
    let request = collect_request(cli)?;

    let pipeline = Pipeline::new(Project::new(&cli.project), TigerSource::new(&cli.base_url, cli.year));
    let report = pipeline.run(&request)?;

    info!("All done.");
    let clipped = pipeline.project().clipped();
    let clipped = std::path::absolute(&clipped).unwrap_or(clipped);
    println!("Clipped outputs saved in: {}", clipped.display());

    Ok(report)
}
