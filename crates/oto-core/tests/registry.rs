//! Process-wide decoder registry installation
//!
//! Kept in its own test binary: the registry can be installed once per
//! process, so nothing else here may touch it first.

use std::path::Path;

use oto_core::source::{
    install_registry, registry, DecoderRegistry, PcmSource, SampleSource, SourceProvider, SourceResult,
};
use oto_core::StereoSample;

fn decode_click(_path: &Path) -> SourceResult<PcmSource> {
    Ok(PcmSource::new(vec![StereoSample::mono(1.0); 10], 48000, 1))
}

#[test]
fn registry_installs_once_and_is_fixed_afterwards() {
    let mut custom = DecoderRegistry::new();
    custom.register("click", &["click"], decode_click);

    let installed = install_registry(custom).unwrap();
    assert!(std::ptr::eq(installed, registry()));
    assert_eq!(registry().extensions().collect::<Vec<_>>(), vec!["click"]);

    // A second install is refused and hands the registry back
    let rejected = install_registry(DecoderRegistry::with_basic_formats()).unwrap_err();
    assert!(rejected.find(Path::new("a.wav")).is_some());
    assert!(registry().find(Path::new("a.wav")).is_none());

    // Providers built from the global registry use the installed decoders
    let track = SourceProvider::default().open(Path::new("/samples/rim.click")).unwrap();
    assert_eq!(track.title(), "rim.click");
    assert_eq!(track.source().length_in_samples(), 10);
}
