use crate::packet::lines::LineClassifier;

pub fn split_sequence_blocks(classifier: &LineClassifier, lines: &[String]) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in lines {
        if classifier.is_sequence_start(line) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current.push(line.clone());
            continue;
        }

        if current.is_empty() {
            continue;
        }

        current.push(line.clone());
        if classifier.has_totals(line) {
            blocks.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
