//! Compute an impact profile for a sample contributor

fn main() {
    let json = r#"{
        "handle": "octocat",
        "commitsTotal": 640,
        "activeDays": 180,
        "prsMergedCount": 45,
        "prsMergedWeight": 70.0,
        "reviewsSubmittedCount": 60,
        "issuesClosedCount": 25,
        "linesAdded": 42000,
        "linesDeleted": 18000,
        "reposContributed": 6,
        "topRepoShare": 0.55,
        "maxCommitsIn10Min": 4,
        "totalStars": 120,
        "totalForks": 20,
        "totalWatchers": 15,
        "docsContributions": 3
    }"#;

    match devimpact::impact_to_json(json) {
        Ok(result) => println!("{result}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
