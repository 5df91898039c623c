//! Instruction builder for the generation-service escalation path.

/// Fixed instruction header: domain statement, the four correction
/// categories the service may apply, and the minimal-edit constraint
const INSTRUCTION_HEADER: &str = "\
以下は大規模言語モデル講座の書き起こしテキストです。音声認識による誤りを修正し、自然で正確な日本語にしてください。

【修正カテゴリ】
1. 固有名詞・専門用語の修正（人名・組織名・製品名を正確に）
2. 音韻類似による誤認識の修正（発音が似た別語への聞き間違い）
3. 文脈依存の語句修正（前後の内容から本来の語句を復元）
4. 話し言葉の書き言葉への自然化

【制約】
- 元の意味を必ず保持すること
- 修正は必要最小限に留めること
- 修正後のテキストのみを出力すること
";

/// Build the full correction instruction for one segment's text
pub fn build_correction_instruction(text: &str) -> String {
    format!("{}\n【修正対象テキスト】\n{}\n\n【修正後】:", INSTRUCTION_HEADER, text)
}
