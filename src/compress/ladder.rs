// 圧縮ラダー: バイト予算に収まるまで縮小・再エンコード・再合成を繰り返す

use tracing::{debug, instrument};

use crate::compress::profile::{CompressionProfile, default_ladder};
use crate::error::PdfSearchError;
use crate::page::PagePair;
use crate::pipeline::compositor::{Compositor, PageDocument};

/// Result of driving one page through the ladder.
#[derive(Debug, Clone)]
pub struct LadderOutcome {
    pub document: PageDocument,
    /// Name of the profile that produced `document`.
    pub profile: String,
    /// Factor applied to the original image and its regions.
    pub scale: f64,
    /// Compositions performed, the identity attempt included.
    pub attempts: usize,
    /// `false` when even the best attempt is over budget.
    pub budget_met: bool,
}

/// Ordered compression profiles, mildest first.
#[derive(Debug, Clone)]
pub struct CompressionLadder {
    profiles: Vec<CompressionProfile>,
}

impl Default for CompressionLadder {
    fn default() -> Self {
        Self {
            profiles: default_ladder(),
        }
    }
}

impl CompressionLadder {
    pub fn new(profiles: Vec<CompressionProfile>) -> crate::error::Result<Self> {
        if profiles.is_empty() {
            return Err(PdfSearchError::config(
                "compression ladder needs at least one profile",
            ));
        }
        for profile in &profiles {
            profile.validate()?;
        }
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[CompressionProfile] {
        &self.profiles
    }

    /// ページを予算内に収める。
    ///
    /// 1. 元の解像度・可逆圧縮で合成し、予算内ならそのまま返す。
    /// 2. 予算超過ならプロファイルを順に試す。各段は常に元のペアから
    ///    縮小するため、誤差は累積しない。
    /// 3. 全段で超過した場合は無圧縮を含む全試行のうち最小のものを
    ///    `budget_met = false` で返す。
    #[instrument(skip_all, fields(
        width = pair.image().width(),
        height = pair.image().height(),
        regions = pair.regions().len(),
        budget = budget,
    ))]
    pub fn compress(
        &self,
        compositor: &dyn Compositor,
        pair: &PagePair,
        budget: u64,
    ) -> crate::error::Result<LadderOutcome> {
        let identity = CompressionProfile::identity();
        let document = compositor.compose(pair, &identity.encoding_for(pair.image().image()))?;
        debug!(profile = %identity.name, size = document.size(), "ladder attempt");
        let budget_met = document.size() <= budget;
        let identity = LadderOutcome {
            document,
            profile: identity.name,
            scale: 1.0,
            attempts: 1,
            budget_met,
        };
        if budget_met {
            return Ok(identity);
        }

        let (width, height) = (pair.image().width(), pair.image().height());
        let mut attempts = 1;
        // 無圧縮の試行も最小候補に含める
        let mut smallest = identity;

        for profile in &self.profiles {
            let scale = profile.scale_for(width, height);
            let scaled = pair.rescaled(scale);
            let encoding = profile.encoding_for(scaled.image().image());
            let document = compositor.compose(&scaled, &encoding)?;
            attempts += 1;
            debug!(
                profile = %profile.name,
                scale,
                size = document.size(),
                "ladder attempt"
            );

            let budget_met = document.size() <= budget;
            let outcome = LadderOutcome {
                document,
                profile: profile.name.clone(),
                scale,
                attempts,
                budget_met,
            };
            if budget_met {
                return Ok(outcome);
            }
            // 同サイズなら後段(より強い圧縮)を優先
            if outcome.document.size() <= smallest.document.size() {
                smallest = outcome;
            }
        }

        smallest.attempts = attempts;
        debug!(
            profile = %smallest.profile,
            size = smallest.document.size(),
            budget,
            "ladder exhausted over budget"
        );
        Ok(smallest)
    }
}
