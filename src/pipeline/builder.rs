//! Presentation Builder: empty deck → one image slide per page → commit.

use crate::config::SlideGeometry;
use crate::error::Pdf2SlidesError;
use crate::google::drive::RemoteAsset;
use crate::google::requests::{BatchUpdate, SlideBatch};
use crate::google::slides::{Presentation, PresentationService};
use tracing::info;

/// Drives a [`PresentationService`] with fixed slide geometry.
pub struct PresentationBuilder<'a> {
    service: &'a dyn PresentationService,
    geometry: SlideGeometry,
}

impl<'a> PresentationBuilder<'a> {
    pub fn new(service: &'a dyn PresentationService, geometry: SlideGeometry) -> Self {
        Self { service, geometry }
    }

    /// Create a new, empty presentation (it carries one default slide).
    pub async fn create_empty(&self, title: &str) -> Result<Presentation, Pdf2SlidesError> {
        let presentation = self.service.create(title).await?;
        info!("Created presentation '{}' ({})", title, presentation.id);
        Ok(presentation)
    }

    /// Start an incremental batch; the pipeline pushes one page at a time.
    pub fn begin(&self) -> SlideBatch {
        SlideBatch::new(self.geometry)
    }

    /// Build the whole batch at once from already-uploaded assets.
    pub fn append_image_slides(
        &self,
        presentation: &Presentation,
        assets: &[RemoteAsset],
    ) -> BatchUpdate {
        let mut batch = self.begin();
        for (index, asset) in assets.iter().enumerate() {
            batch.push_image_slide(index, &asset.url);
        }
        batch.finish(&presentation.default_slide_id)
    }

    /// Apply `batch` in a single atomic `batchUpdate` call.
    pub async fn commit(
        &self,
        presentation: &Presentation,
        batch: &BatchUpdate,
    ) -> Result<(), Pdf2SlidesError> {
        info!(
            "Committing {} requests to presentation {}",
            batch.len(),
            presentation.id
        );
        self.service.batch_update(&presentation.id, batch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::requests::Request;
    use crate::google::slides::BatchUpdateResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        committed: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl PresentationService for Recording {
        async fn create(&self, _title: &str) -> Result<Presentation, Pdf2SlidesError> {
            Ok(Presentation {
                id: "deck".into(),
                default_slide_id: "p".into(),
            })
        }

        async fn batch_update(
            &self,
            presentation_id: &str,
            batch: &BatchUpdate,
        ) -> Result<BatchUpdateResponse, Pdf2SlidesError> {
            self.committed
                .lock()
                .unwrap()
                .push((presentation_id.to_string(), batch.len()));
            Ok(BatchUpdateResponse::default())
        }
    }

    fn asset(id: &str) -> RemoteAsset {
        RemoteAsset {
            file_id: id.into(),
            permission_id: None,
            url: crate::google::drive::public_url(id),
        }
    }

    #[tokio::test]
    async fn append_image_slides_orders_pages_then_delete() {
        let service = Recording::default();
        let builder = PresentationBuilder::new(&service, SlideGeometry::default());
        let deck = builder.create_empty("Notes").await.unwrap();

        let batch = builder.append_image_slides(&deck, &[asset("a"), asset("b")]);
        assert_eq!(batch.created_slide_ids(), vec!["slide_page_0", "slide_page_1"]);
        let urls: Vec<&str> = batch
            .requests
            .iter()
            .filter_map(|r| match r {
                Request::CreateImage(c) => Some(c.url.as_str()),
                _ => None,
            })
            .collect();
        assert!(urls[0].contains("id=a") && urls[1].contains("id=b"));
        assert!(matches!(batch.requests.last(), Some(Request::DeleteObject(_))));

        builder.commit(&deck, &batch).await.unwrap();
        assert_eq!(
            *service.committed.lock().unwrap(),
            vec![("deck".to_string(), 5)]
        );
    }
}
