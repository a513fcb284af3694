//! Ties components A–M together: pick an architecture slice, run both
//! metadata processors, and hand the result to a visitor (§5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::fixups::ChainedFixups;
use crate::macho::MachOFile;
use crate::objc::ObjCProcessor;
use crate::options::ReadOptions;
use crate::registry::{MethodSignatureRegistry, StructureRegistry};
use crate::swift::SwiftProcessor;
use crate::visitor::ExtractedModel;

/// Runs the Objective-C and Swift processors over a single architecture
/// slice and aggregates their output into one [`ExtractedModel`].
pub fn extract(data: &[u8], options: &ReadOptions) -> Result<ExtractedModel> {
    let container = Container::parse(data)?;
    let slice = match options.arch {
        Some(requested) => container.best_match(requested)?,
        None => match &container {
            Container::Thin(thin) => *thin,
            Container::Fat { .. } => {
                let (_, first) = container.slices()?.into_iter().next().ok_or(Error::ArchitectureNotFound)?;
                first
            }
        },
    };

    let file = MachOFile::parse(slice)?;
    let fixups = file
        .chained_fixups_bytes()
        .and_then(|bytes| ChainedFixups::parse(bytes).ok());

    let objc = ObjCProcessor::process(&file, fixups.as_ref());
    let swift = SwiftProcessor::process(&file);

    Ok(ExtractedModel::build(&file, objc, swift))
}

/// Populates a method-signature registry and a structure registry from one
/// extracted model (§4.K), for callers that want the cross-indexes without
/// re-walking method lists themselves.
pub fn index(model: &ExtractedModel) -> (MethodSignatureRegistry, StructureRegistry) {
    let selectors = MethodSignatureRegistry::new();
    let structures = StructureRegistry::new();

    for class in &model.objc.classes {
        if let Some(methods) = &class.data.base_methods {
            record_method_signatures(&selectors, methods, crate::registry::SignatureSource::Class);
        }
    }
    for protocol in &model.objc.protocols {
        for selector_entry in protocol.extended_method_types.iter().zip(
            protocol
                .instance_methods
                .as_ref()
                .map(|l| l.methods.iter())
                .into_iter()
                .flatten(),
        ) {
            let (extended_type, method) = selector_entry;
            selectors.record(&method.selector, extended_type, crate::registry::SignatureSource::Protocol);
        }
    }
    for category in &model.objc.categories {
        if let Some(methods) = &category.instance_methods {
            record_method_signatures(&selectors, methods, crate::registry::SignatureSource::Category);
        }
    }

    for class in &model.objc.classes {
        if let Some(ivars) = &class.data.ivars {
            for ivar in &ivars.ivars {
                if let Ok(ty) = crate::encoding::parse_type(&ivar.type_encoding) {
                    if let crate::encoding::TypeKind::Structure { name: Some(name), .. } = &ty.kind {
                        structures.observe(name, &ty);
                    }
                }
            }
        }
    }

    (selectors, structures)
}

fn record_method_signatures(
    registry: &MethodSignatureRegistry,
    methods: &crate::objc::MethodList,
    source: crate::registry::SignatureSource,
) {
    for method in &methods.methods {
        registry.record(&method.selector, &method.type_encoding, source);
    }
}

/// A cooperative stop flag checked between the coarse phases of
/// [`extract`] (§5). Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Cancellation(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Processes a batch of `(label, bytes)` pairs across a small bounded pool
/// of threads, merging each worker's structure registry into the result
/// (§5 "a bounded worker pool"). Errors for one file don't abort the rest.
pub fn process_many(
    files: Vec<(String, Vec<u8>)>,
    options: &ReadOptions,
    worker_count: usize,
    cancellation: &Cancellation,
) -> Vec<(String, Result<ExtractedModel>)> {
    let worker_count = worker_count.max(1).min(files.len().max(1));
    let chunks = split_round_robin(files, worker_count);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let cancellation = cancellation.clone();
            handles.push(scope.spawn(move || {
                let mut out = Vec::with_capacity(chunk.len());
                for (label, bytes) in chunk {
                    if cancellation.is_cancelled() {
                        out.push((label, Err(Error::UnsupportedFormat("cancelled before processing"))));
                        continue;
                    }
                    out.push((label, extract(&bytes, options)));
                }
                out
            }));
        }
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    })
}

fn split_round_robin<T>(items: Vec<T>, worker_count: usize) -> Vec<Vec<T>> {
    let mut chunks: Vec<Vec<T>> = (0..worker_count).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        chunks[i % worker_count].push(item);
    }
    chunks
}
