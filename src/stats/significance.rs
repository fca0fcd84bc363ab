//! Between-site significance tests: one-way ANOVA and Kruskal-Wallis.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};
use thiserror::Error;

use crate::data::model::{Site, SolarTable};

use super::summary;

/// p-value threshold for [`TestResult::significant`].
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestStatistic {
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    /// F-statistic and p-value.
    pub anova: TestStatistic,
    /// H-statistic and p-value.
    pub kruskal: TestStatistic,
    /// ANOVA p-value below [`SIGNIFICANCE_LEVEL`].
    pub significant: bool,
}

/// Preconditions of the tests that the data did not meet.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignificanceError {
    #[error("need at least 2 sites with observations, found {found}")]
    InsufficientGroups { found: usize },
    #[error("every site has a single observation; within-site variance is undefined")]
    NoResidualDegreesOfFreedom,
    #[error("all observations are identical; ranks carry no information")]
    IdenticalValues,
    #[error("invalid {name} distribution: {reason}")]
    Distribution { name: &'static str, reason: String },
}

/// Compare `metric` across sites.
///
/// Groups are the sites in order of first appearance, each with its own
/// missing values dropped; sites left empty do not count as groups.
/// `Ok(None)` when the metric column is absent.
pub fn anova_and_kruskal(
    table: &SolarTable,
    metric: &str,
) -> Result<Option<TestResult>, SignificanceError> {
    let Some(column) = table.column(metric) else {
        return Ok(None);
    };

    let groups: Vec<(Site, Vec<f64>)> = table
        .rows_by_site()
        .into_iter()
        .map(|(site, rows)| (site, column.present_at(&rows)))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    if groups.len() < 2 {
        return Err(SignificanceError::InsufficientGroups {
            found: groups.len(),
        });
    }

    let samples: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
    let anova = one_way_anova(&samples)?;
    let kruskal = kruskal_wallis(&samples)?;

    Ok(Some(TestResult {
        anova,
        kruskal,
        significant: anova.p_value < SIGNIFICANCE_LEVEL,
    }))
}

/// One-way analysis of variance. Requires at least two non-empty groups.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<TestStatistic, SignificanceError> {
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 {
        return Err(SignificanceError::InsufficientGroups { found: k });
    }
    if n <= k {
        return Err(SignificanceError::NoResidualDegreesOfFreedom);
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = summary::mean(g);
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    if ms_within == 0.0 {
        // Every group is constant: any spread between groups is decisive.
        return Ok(if ms_between > 0.0 {
            TestStatistic {
                statistic: f64::INFINITY,
                p_value: 0.0,
            }
        } else {
            TestStatistic {
                statistic: f64::NAN,
                p_value: f64::NAN,
            }
        });
    }

    let f = ms_between / ms_within;
    let dist = FisherSnedecor::new(df_between, df_within).map_err(|e| {
        SignificanceError::Distribution {
            name: "F",
            reason: e.to_string(),
        }
    })?;
    Ok(TestStatistic {
        statistic: f,
        p_value: dist.sf(f),
    })
}

/// Kruskal-Wallis H test with average ranks for ties and tie correction.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestStatistic, SignificanceError> {
    let k = groups.len();
    if k < 2 {
        return Err(SignificanceError::InsufficientGroups { found: k });
    }

    let mut pooled: Vec<(f64, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(gi, g)| g.iter().map(move |&v| (v, gi)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pooled.len();
    let mut rank_sums = vec![0.0; k];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && pooled[j].0 == pooled[i].0 {
            j += 1;
        }
        // Ranks i+1..=j share their average.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &(_, gi) in &pooled[i..j] {
            rank_sums[gi] += avg_rank;
        }
        let t = (j - i) as f64;
        tie_term += t.powi(3) - t;
        i = j;
    }

    let nf = n as f64;
    let correction = 1.0 - tie_term / (nf.powi(3) - nf);
    if correction <= 0.0 {
        return Err(SignificanceError::IdenticalValues);
    }

    let h_raw = 12.0 / (nf * (nf + 1.0))
        * groups
            .iter()
            .zip(&rank_sums)
            .map(|(g, &r)| r * r / g.len() as f64)
            .sum::<f64>()
        - 3.0 * (nf + 1.0);
    let h = (h_raw / correction).max(0.0);

    let dist = ChiSquared::new((k - 1) as f64).map_err(|e| SignificanceError::Distribution {
        name: "chi-squared",
        reason: e.to_string(),
    })?;
    Ok(TestStatistic {
        statistic: h,
        p_value: dist.sf(h),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{GHI, NumericColumn};

    fn table(groups: Vec<(Site, Vec<Option<f64>>)>) -> SolarTable {
        let mut sites = Vec::new();
        let mut values = Vec::new();
        for (site, group) in groups {
            sites.extend(std::iter::repeat(site).take(group.len()));
            values.extend(group);
        }
        SolarTable::new(None, sites, vec![NumericColumn::new(GHI, values)]).unwrap()
    }

    #[test]
    fn identical_groups_are_not_significant() {
        let g = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        let t = table(vec![
            (Site::Benin, g.clone()),
            (Site::SierraLeone, g.clone()),
            (Site::Togo, g),
        ]);
        let result = anova_and_kruskal(&t, GHI).unwrap().unwrap();
        assert!(result.anova.statistic.abs() < 1e-12);
        assert!((result.anova.p_value - 1.0).abs() < 1e-9);
        assert!(result.kruskal.statistic.abs() < 1e-12);
        assert!((result.kruskal.p_value - 1.0).abs() < 1e-9);
        assert!(!result.significant);
    }

    #[test]
    fn separated_groups_match_reference() {
        let a = [6.0, 8.0, 4.0, 5.0, 3.0, 4.0];
        let b = [8.0, 12.0, 9.0, 11.0, 6.0, 8.0];
        let c = [13.0, 9.0, 11.0, 8.0, 7.0, 12.0];
        let groups: [&[f64]; 3] = [&a, &b, &c];

        let anova = one_way_anova(&groups).unwrap();
        assert!((anova.statistic - 9.264_705_882).abs() < 1e-6);
        assert!((anova.p_value - 0.002_398_777).abs() < 1e-6);

        let kw = kruskal_wallis(&groups).unwrap();
        assert!((kw.statistic - 9.420_684_836).abs() < 1e-6);
        assert!((kw.p_value - 0.009_001_695).abs() < 1e-6);
    }

    #[test]
    fn significance_follows_the_anova_p_value() {
        let low = (0..30).map(|i| Some(f64::from(i % 5))).collect();
        let high = (0..30).map(|i| Some(100.0 + f64::from(i % 5))).collect();
        let t = table(vec![(Site::Benin, low), (Site::Togo, high)]);
        let result = anova_and_kruskal(&t, GHI).unwrap().unwrap();
        assert!(result.anova.p_value < SIGNIFICANCE_LEVEL);
        assert!(result.significant);
    }

    #[test]
    fn missing_values_are_dropped_per_site() {
        let t = table(vec![
            (Site::Benin, vec![Some(1.0), None, Some(2.0), Some(3.0)]),
            (Site::Togo, vec![None, Some(1.0), Some(2.0), Some(3.0)]),
        ]);
        let result = anova_and_kruskal(&t, GHI).unwrap().unwrap();
        assert!((result.anova.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn absent_metric_is_no_result() {
        let t = table(vec![(Site::Benin, vec![Some(1.0)])]);
        assert_eq!(anova_and_kruskal(&t, "DNI"), Ok(None));
    }

    #[test]
    fn one_non_empty_site_is_an_explicit_error() {
        let t = table(vec![
            (Site::Benin, vec![Some(1.0), Some(2.0)]),
            (Site::Togo, vec![None, None]),
        ]);
        assert_eq!(
            anova_and_kruskal(&t, GHI),
            Err(SignificanceError::InsufficientGroups { found: 1 })
        );
    }

    #[test]
    fn single_observation_per_site_is_an_explicit_error() {
        let t = table(vec![(Site::Benin, vec![Some(1.0)]), (Site::Togo, vec![Some(2.0)])]);
        assert_eq!(
            anova_and_kruskal(&t, GHI),
            Err(SignificanceError::NoResidualDegreesOfFreedom)
        );
    }

    #[test]
    fn all_identical_values_are_an_explicit_error() {
        let t = table(vec![
            (Site::Benin, vec![Some(5.0), Some(5.0)]),
            (Site::Togo, vec![Some(5.0), Some(5.0)]),
        ]);
        assert_eq!(
            anova_and_kruskal(&t, GHI),
            Err(SignificanceError::IdenticalValues)
        );
    }

    #[test]
    fn constant_but_different_groups_are_decisive() {
        let groups: [&[f64]; 2] = [&[1.0, 1.0], &[2.0, 2.0]];
        let anova = one_way_anova(&groups).unwrap();
        assert!(anova.statistic.is_infinite());
        assert_eq!(anova.p_value, 0.0);
    }
}
