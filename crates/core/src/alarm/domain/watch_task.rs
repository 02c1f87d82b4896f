use std::sync::Arc;

use crate::alarm::domain::reference_cache::ReferenceCache;
use crate::fingerprint::domain::fingerprint::Fingerprint;
use crate::shared::frame::Frame;

/// What the watch list knows about one subject: a reference image, a
/// previously computed fingerprint, or both.
///
/// The cache is shared by handle. Clone a `DistinguishingData` (or pass the
/// same `Arc<ReferenceCache>` to [`with_cache`](Self::with_cache)) to have
/// several tasks reuse one lazily computed fingerprint.
#[derive(Debug, Clone)]
pub struct DistinguishingData {
    image: Option<Frame>,
    cache: Arc<ReferenceCache>,
}

impl DistinguishingData {
    pub fn from_image(image: Frame) -> Self {
        Self {
            image: Some(image),
            cache: Arc::new(ReferenceCache::new()),
        }
    }

    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            image: None,
            cache: Arc::new(ReferenceCache::with_fingerprint(fingerprint)),
        }
    }

    pub fn with_cache(image: Option<Frame>, cache: Arc<ReferenceCache>) -> Self {
        Self { image, cache }
    }

    pub fn image(&self) -> Option<&Frame> {
        self.image.as_ref()
    }

    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    pub fn cached_fingerprint(&self) -> Option<Fingerprint> {
        self.cache.get()
    }
}

/// One alarm evaluation request.
///
/// `candidates` and `identifiers` are parallel; the evaluator rejects a
/// task whose lengths differ. A `None` candidate slot stands for an image
/// the host failed to supply.
#[derive(Debug, Clone)]
pub struct WatchTask {
    pub reference: DistinguishingData,
    pub candidates: Vec<Option<Frame>>,
    pub identifiers: Vec<String>,
    pub level: i64,
}

impl WatchTask {
    pub fn new(
        reference: DistinguishingData,
        candidates: Vec<Frame>,
        identifiers: Vec<String>,
        level: i64,
    ) -> Self {
        Self::from_slots(
            reference,
            candidates.into_iter().map(Some).collect(),
            identifiers,
            level,
        )
    }

    pub fn from_slots(
        reference: DistinguishingData,
        candidates: Vec<Option<Frame>>,
        identifiers: Vec<String>,
        level: i64,
    ) -> Self {
        Self {
            reference,
            candidates,
            identifiers,
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::domain::fingerprint::FingerprintAlgorithm;

    #[test]
    fn test_from_image_starts_with_empty_cache() {
        let data = DistinguishingData::from_image(Frame::filled(4, 4, [1, 2, 3]));
        assert!(data.image().is_some());
        assert_eq!(data.cached_fingerprint(), None);
    }

    #[test]
    fn test_from_fingerprint_preseeds_cache() {
        let fp = Fingerprint::new(FingerprintAlgorithm::Average, 0xabc);
        let data = DistinguishingData::from_fingerprint(fp);
        assert!(data.image().is_none());
        assert_eq!(data.cached_fingerprint(), Some(fp));
    }

    #[test]
    fn test_clones_share_cache() {
        let data = DistinguishingData::from_image(Frame::filled(4, 4, [0, 0, 0]));
        let copy = data.clone();
        let fp = Fingerprint::new(FingerprintAlgorithm::Average, 5);
        copy.cache().get_or_compute(|| Some(fp));
        assert_eq!(data.cached_fingerprint(), Some(fp));
        assert!(Arc::ptr_eq(data.cache(), copy.cache()));
    }

    #[test]
    fn test_new_wraps_every_candidate() {
        let task = WatchTask::new(
            DistinguishingData::from_image(Frame::filled(4, 4, [0, 0, 0])),
            vec![Frame::filled(2, 2, [0, 0, 0]); 3],
            vec!["a".into(), "b".into(), "c".into()],
            1,
        );
        assert_eq!(task.candidates.len(), 3);
        assert!(task.candidates.iter().all(Option::is_some));
    }
}
