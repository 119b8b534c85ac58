use itertools::Itertools;
use serde_json::Value;

/// Expands a parameter document into one concrete variant per combination
/// of its list-valued keys.
///
/// `{"strategy":"coveredcall","dte":[2,5],"delta":[0.3]}` becomes two
/// documents, one with `dte: 2` and one with `dte: 5`, both with
/// `delta: 0.3`. Scalar keys are carried through untouched. A document with
/// no list-valued keys expands to itself; a key mapped to an empty list
/// yields no variants at all.
///
/// Every variant is an independent deep copy.
pub fn expand_parameters(document: &Value) -> Vec<Value> {
    let object = match document.as_object() {
        Some(object) => object,
        None => return vec![document.clone()],
    };

    let list_keys: Vec<(&String, &Vec<Value>)> = object
        .iter()
        .filter_map(|(key, value)| value.as_array().map(|array| (key, array)))
        .collect();
    if list_keys.is_empty() {
        return vec![document.clone()];
    }

    let mut variants = Vec::new();
    for combination in list_keys
        .iter()
        .map(|(_, candidates)| candidates.iter())
        .multi_cartesian_product()
    {
        let mut variant = document.clone();
        if let Some(map) = variant.as_object_mut() {
            for ((key, _), value) in list_keys.iter().zip(combination) {
                map.insert((*key).clone(), value.clone());
            }
        }
        variants.push(variant);
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_only_documents_pass_through() {
        let document = json!({"strategy": "buyandhold", "dte": 5});
        let variants = expand_parameters(&document);
        assert_eq!(variants, vec![document]);
    }

    #[test]
    fn list_keys_expand_to_the_full_product() {
        let document = json!({
            "strategy": "coveredcall",
            "dte": [2, 5],
            "delta": [0.3],
        });
        let variants = expand_parameters(&document);
        assert_eq!(variants.len(), 2);
        for variant in &variants {
            assert_eq!(variant["strategy"], "coveredcall");
            assert_eq!(variant["delta"], 0.3);
        }
        let dtes: Vec<i64> = variants
            .iter()
            .map(|variant| variant["dte"].as_i64().unwrap())
            .collect();
        assert!(dtes.contains(&2) && dtes.contains(&5));
    }

    #[test]
    fn two_list_keys_cross_into_four_variants() {
        let document = json!({
            "strategy": "coveredcall",
            "dte": [2, 5],
            "delta": [0.3, 0.5],
        });
        assert_eq!(expand_parameters(&document).len(), 4);
    }

    #[test]
    fn variants_are_independent_deep_copies() {
        let document = json!({"strategy": "coveredcall", "dte": [2, 5]});
        let mut variants = expand_parameters(&document);
        variants[0]["dte"] = json!(99);
        assert_ne!(variants[0]["dte"], variants[1]["dte"]);
        assert_eq!(document["dte"], json!([2, 5]));
    }

    #[test]
    fn an_empty_candidate_list_yields_no_variants() {
        let document = json!({"strategy": "coveredcall", "dte": []});
        assert!(expand_parameters(&document).is_empty());
    }
}
