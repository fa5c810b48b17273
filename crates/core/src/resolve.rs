use std::collections::HashMap;

use crate::error::RegistryError;
use crate::model::Record;
use crate::score::Scorer;

/// A record that lost its duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discarded {
    pub key: String,
    pub record: Record,
    pub score: u32,
    pub survivor_row: usize,
    pub survivor_score: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One record per distinct key, in order of the key's first occurrence.
    pub survivors: Vec<Record>,
    /// Group losers, grouped by key in first-occurrence order, best-ranked first.
    pub discarded: Vec<Discarded>,
}

impl Resolution {
    pub fn discarded_keys(&self) -> impl Iterator<Item = &str> {
        self.discarded.iter().map(|d| d.key.as_str())
    }
}

/// Select exactly one survivor per key.
///
/// Groups of one survive unconditionally. Larger groups are ranked by score,
/// descending, ties broken by input position; the first-ranked record wins.
/// Only a failing `key_fn` makes this return an error.
pub fn resolve<F>(
    records: Vec<Record>,
    key_fn: F,
    scorer: &dyn Scorer,
) -> Result<Resolution, RegistryError>
where
    F: Fn(&Record) -> Result<String, RegistryError>,
{
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<(usize, Record)>)> = Vec::new();

    for (position, record) in records.into_iter().enumerate() {
        let key = key_fn(&record)?;
        match group_index.get(&key) {
            Some(&g) => groups[g].1.push((position, record)),
            None => {
                group_index.insert(key.clone(), groups.len());
                groups.push((key, vec![(position, record)]));
            }
        }
    }

    let mut resolution = Resolution {
        survivors: Vec::with_capacity(groups.len()),
        discarded: Vec::new(),
    };

    for (key, members) in groups {
        if members.len() == 1 {
            resolution
                .survivors
                .extend(members.into_iter().map(|(_, record)| record));
            continue;
        }

        let mut ranked: Vec<(u32, usize, Record)> = members
            .into_iter()
            .map(|(position, record)| (scorer.score(&record), position, record))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut ranked = ranked.into_iter();
        let Some((survivor_score, _, survivor)) = ranked.next() else {
            continue;
        };

        log::debug!(
            "key {key}: row {} survives with score {survivor_score} over {} duplicate(s)",
            survivor.row,
            ranked.len(),
        );

        for (score, _, record) in ranked {
            resolution.discarded.push(Discarded {
                key: key.clone(),
                record,
                score,
                survivor_row: survivor.row,
                survivor_score,
            });
        }
        resolution.survivors.push(survivor);
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeyScheme;
    use crate::score::{CompletenessScorer, PenaltyScorer};

    fn rec(row: usize, pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(row, pairs.iter().copied())
    }

    fn by_identifier(r: &Record) -> Result<String, RegistryError> {
        KeyScheme::Identifier.key_for(r)
    }

    #[test]
    fn empty_input() {
        let res = resolve(vec![], by_identifier, &CompletenessScorer).unwrap();
        assert!(res.survivors.is_empty());
        assert!(res.discarded.is_empty());
    }

    #[test]
    fn singletons_survive_in_order() {
        let records = vec![
            rec(0, &[("identificacion", "222222")]),
            rec(1, &[("identificacion", "111111")]),
        ];
        let res = resolve(records, by_identifier, &CompletenessScorer).unwrap();
        let rows: Vec<usize> = res.survivors.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert!(res.discarded.is_empty());
    }

    #[test]
    fn higher_score_wins() {
        let a = rec(0, &[("identificacion", "123456"), ("nombres", "ana")]);
        let b = rec(
            1,
            &[
                ("identificacion", "123456"),
                ("nombres", "ana maria"),
                ("apellidos", "lopez"),
                ("tipo_documento", "CC"),
            ],
        );
        let res = resolve(vec![a, b], by_identifier, &CompletenessScorer).unwrap();
        assert_eq!(res.survivors.len(), 1);
        assert_eq!(res.survivors[0].row, 1);
        assert_eq!(res.discarded.len(), 1);
        assert_eq!(res.discarded[0].record.row, 0);
        assert_eq!(res.discarded[0].score, 2);
        assert_eq!(res.discarded[0].survivor_score, 5);
        assert_eq!(res.discarded_keys().collect::<Vec<_>>(), vec!["123456"]);
    }

    #[test]
    fn ties_go_to_earliest_input() {
        let records = vec![
            rec(10, &[("identificacion", "123456"), ("nombres", "Ana")]),
            rec(11, &[("identificacion", "123456"), ("nombres", "Eva")]),
            rec(12, &[("identificacion", "123456"), ("nombres", "Luz")]),
        ];
        let res = resolve(records, by_identifier, &CompletenessScorer).unwrap();
        assert_eq!(res.survivors[0].row, 10);
        let losers: Vec<usize> = res.discarded.iter().map(|d| d.record.row).collect();
        assert_eq!(losers, vec![11, 12]);
    }

    #[test]
    fn survivors_follow_first_occurrence_of_key() {
        let records = vec![
            rec(0, &[("identificacion", "200000")]),
            rec(1, &[("identificacion", "100000")]),
            rec(2, &[("identificacion", "200000"), ("nombres", "Ana"), ("apellidos", "Paz")]),
        ];
        let res = resolve(records, by_identifier, &CompletenessScorer).unwrap();
        let rows: Vec<usize> = res.survivors.iter().map(|r| r.row).collect();
        // Key 200000 first appeared before 100000; its survivor is row 2.
        assert_eq!(rows, vec![2, 1]);
    }

    #[test]
    fn key_scheme_changes_grouping() {
        let records = vec![
            rec(0, &[("identificacion", "900123456"), ("tipo_documento", "NIT")]),
            rec(1, &[("identificacion", "900123456"), ("tipo_documento", "cc")]),
            rec(2, &[("identificacion", "900123456"), ("tipo_documento", "nit")]),
        ];
        let by_type =
            resolve(records.clone(), |r| KeyScheme::IdentifierDocumentType.key_for(r), &CompletenessScorer)
                .unwrap();
        assert_eq!(by_type.survivors.len(), 2);
        assert_eq!(by_type.discarded[0].key, "900123456|NIT");

        let by_id = resolve(records, by_identifier, &CompletenessScorer).unwrap();
        assert_eq!(by_id.survivors.len(), 1);
    }

    #[test]
    fn injected_scorer_is_used() {
        let mixed = rec(0, &[("identificacion", "123456"), ("nombres", "Ana Maria Lopez Diaz")]);
        let split = rec(1, &[("identificacion", "123456"), ("nombres", "Ana"), ("apellidos", "Lopez Diaz")]);
        let res = resolve(vec![mixed, split], by_identifier, &PenaltyScorer).unwrap();
        assert_eq!(res.survivors[0].row, 1);
    }

    #[test]
    fn key_fn_failure_propagates() {
        let records = vec![rec(0, &[("identificacion", "123456")]), rec(1, &[("nombres", "Ana")])];
        let err = resolve(records, by_identifier, &CompletenessScorer).unwrap_err();
        assert!(matches!(err, RegistryError::KeyUnavailable { row: 1, .. }));
    }

    #[test]
    fn repeated_runs_select_same_survivor() {
        let records: Vec<Record> = (0..20)
            .map(|i| {
                let nombres = if i % 3 == 0 { "Ana" } else { "" };
                rec(i, &[("identificacion", "555555"), ("nombres", nombres)])
            })
            .collect();
        let first = resolve(records.clone(), by_identifier, &CompletenessScorer).unwrap();
        let second = resolve(records, by_identifier, &CompletenessScorer).unwrap();
        assert_eq!(first.survivors, second.survivors);
        assert_eq!(first.discarded, second.discarded);
        assert_eq!(first.survivors[0].row, 0);
    }
}
