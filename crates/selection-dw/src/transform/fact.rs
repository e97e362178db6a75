use super::dimension::{CandidateDimension, DateDimension, LabelDimension};
use super::keys::SurrogateKey;
use super::StagedRecord;
use serde::Serialize;

/// Minimum score, inclusive, required on both assessments.
pub const HIRING_SCORE_THRESHOLD: i64 = 7;

/// A candidate is hired only when both scores reach the threshold. A missing
/// score never does.
pub fn is_hired(code_challenge_score: Option<i64>, technical_interview_score: Option<i64>) -> bool {
    let passes = |score: Option<i64>| score.is_some_and(|value| value >= HIRING_SCORE_THRESHOLD);
    passes(code_challenge_score) && passes(technical_interview_score)
}

/// One selection outcome resolved against every dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactRow {
    pub selection_id: SurrogateKey,
    pub candidate_id: SurrogateKey,
    pub date_id: SurrogateKey,
    pub country_id: SurrogateKey,
    pub technology_id: SurrogateKey,
    pub seniority_id: SurrogateKey,
    pub code_challenge_score: Option<i64>,
    pub technical_interview_score: Option<i64>,
    pub hired: bool,
}

/// Dimension tables the fact builder joins against.
pub struct DimensionSet<'a> {
    pub candidates: &'a CandidateDimension,
    pub dates: &'a DateDimension,
    pub countries: &'a LabelDimension,
    pub technologies: &'a LabelDimension,
    pub seniorities: &'a LabelDimension,
}

/// Records dropped at each inner join, in join order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinLosses {
    pub candidate: usize,
    pub date: usize,
    pub country: usize,
    pub technology: usize,
    pub seniority: usize,
}

impl JoinLosses {
    pub fn total(&self) -> usize {
        self.candidate + self.date + self.country + self.technology + self.seniority
    }
}

struct ResolvedKeys {
    candidate_id: SurrogateKey,
    date_id: SurrogateKey,
    country_id: SurrogateKey,
    technology_id: SurrogateKey,
    seniority_id: SurrogateKey,
}

/// Joins candidate, date, country, technology then seniority. The first
/// join a record fails is the one charged in `JoinLosses`.
fn resolve(
    record: &StagedRecord<'_>,
    dimensions: &DimensionSet<'_>,
    losses: &mut JoinLosses,
) -> Option<ResolvedKeys> {
    let raw = record.raw;

    let Some(candidate_id) = raw
        .email
        .as_deref()
        .and_then(|email| dimensions.candidates.key_for(email))
    else {
        losses.candidate += 1;
        return None;
    };

    let Some(date_id) = record
        .application_date
        .and_then(|date| dimensions.dates.key_for(&date))
    else {
        losses.date += 1;
        return None;
    };

    let Some(country_id) = raw
        .country
        .as_deref()
        .and_then(|country| dimensions.countries.key_for(country))
    else {
        losses.country += 1;
        return None;
    };

    let Some(technology_id) = raw
        .technology
        .as_deref()
        .and_then(|technology| dimensions.technologies.key_for(technology))
    else {
        losses.technology += 1;
        return None;
    };

    let Some(seniority_id) = raw
        .seniority
        .as_deref()
        .and_then(|seniority| dimensions.seniorities.key_for(seniority))
    else {
        losses.seniority += 1;
        return None;
    };

    Some(ResolvedKeys {
        candidate_id,
        date_id,
        country_id,
        technology_id,
        seniority_id,
    })
}

/// Builds one fact row per record that survives every join; `selection_id`
/// follows survival order.
pub fn build_facts(
    records: &[StagedRecord<'_>],
    dimensions: &DimensionSet<'_>,
) -> (Vec<FactRow>, JoinLosses) {
    let mut losses = JoinLosses::default();
    let mut facts = Vec::with_capacity(records.len());

    for record in records {
        let hired = is_hired(
            record.raw.code_challenge_score,
            record.raw.technical_interview_score,
        );

        let Some(keys) = resolve(record, dimensions, &mut losses) else {
            continue;
        };

        facts.push(FactRow {
            selection_id: SurrogateKey::from_position(facts.len()),
            candidate_id: keys.candidate_id,
            date_id: keys.date_id,
            country_id: keys.country_id,
            technology_id: keys.technology_id,
            seniority_id: keys.seniority_id,
            code_challenge_score: record.raw.code_challenge_score,
            technical_interview_score: record.raw.technical_interview_score,
            hired,
        });
    }

    (facts, losses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawRecord;
    use crate::transform::dimension::{
        build_candidate_dimension, build_date_dimension, build_label_dimension,
    };
    use crate::warehouse::schema::TableName;

    #[test]
    fn hiring_rule_requires_both_scores_at_threshold() {
        assert!(is_hired(Some(7), Some(7)));
        assert!(is_hired(Some(10), Some(8)));
        assert!(!is_hired(Some(6), Some(9)));
        assert!(!is_hired(Some(7), Some(6)));
        assert!(!is_hired(None, Some(10)));
        assert!(!is_hired(Some(10), None));
    }

    fn complete(email: &str, date: &str) -> RawRecord {
        RawRecord {
            first_name: Some("Test".into()),
            last_name: Some("Candidate".into()),
            email: Some(email.into()),
            yoe: Some(1),
            application_date: Some(date.into()),
            country: Some("Colombia".into()),
            seniority: Some("Junior".into()),
            technology: Some("QA Automation".into()),
            code_challenge_score: Some(8),
            technical_interview_score: Some(7),
        }
    }

    fn facts_for(raw: &[RawRecord]) -> (Vec<FactRow>, JoinLosses) {
        let staged = raw.iter().map(StagedRecord::from_raw).collect::<Vec<_>>();
        let candidates = build_candidate_dimension(&staged);
        let dates = build_date_dimension(&staged);
        let countries =
            build_label_dimension(TableName::DimCountry, &staged, |r| r.raw.country.clone());
        let technologies =
            build_label_dimension(TableName::DimTechnology, &staged, |r| r.raw.technology.clone());
        let seniorities =
            build_label_dimension(TableName::DimSeniority, &staged, |r| r.raw.seniority.clone());

        build_facts(
            &staged,
            &DimensionSet {
                candidates: &candidates,
                dates: &dates,
                countries: &countries,
                technologies: &technologies,
                seniorities: &seniorities,
            },
        )
    }

    #[test]
    fn join_losses_are_charged_to_the_first_failing_join() {
        let mut no_email = complete("x@x.com", "2020-01-01");
        no_email.email = None;
        no_email.country = None;
        let mut bad_date = complete("y@x.com", "someday");
        bad_date.technology = None;
        let mut no_seniority = complete("z@x.com", "2020-01-02");
        no_seniority.seniority = None;

        let (facts, losses) = facts_for(&[
            complete("a@x.com", "2020-01-01"),
            no_email,
            bad_date,
            no_seniority,
        ]);

        assert_eq!(facts.len(), 1);
        assert_eq!(
            losses,
            JoinLosses {
                candidate: 1,
                date: 1,
                country: 0,
                technology: 0,
                seniority: 1,
            }
        );
        assert_eq!(losses.total(), 3);
    }

    #[test]
    fn selection_ids_follow_survival_order() {
        let mut dropped = complete("b@x.com", "2020-01-02");
        dropped.country = None;

        let (facts, _) = facts_for(&[
            complete("a@x.com", "2020-01-01"),
            dropped,
            complete("c@x.com", "2020-01-03"),
        ]);

        let ids = facts.iter().map(|f| f.selection_id.get()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(facts[1].candidate_id.get(), 3);
        assert_eq!(facts[1].date_id.get(), 3);
    }

    #[test]
    fn scores_are_carried_unchanged() {
        let mut record = complete("a@x.com", "2020-01-01");
        record.code_challenge_score = Some(6);
        record.technical_interview_score = Some(9);

        let (facts, _) = facts_for(&[record]);
        assert_eq!(facts[0].code_challenge_score, Some(6));
        assert_eq!(facts[0].technical_interview_score, Some(9));
        assert!(!facts[0].hired);
    }
}
