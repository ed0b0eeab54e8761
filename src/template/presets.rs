//! Built-in templates.
//!
//! Every prompt asks for the Markdown subset the renderers understand:
//! `## ` and `### ` headings, `- ` list items and plain paragraphs.

use super::Template;

/// Id of the template used when nothing (or something stale) is selected.
pub const DEFAULT_TEMPLATE_ID: &str = "minutes";

const MINUTES_PROMPT: &str = "\
あなたは会議の議事録を作成する専門家です。
与えられた会議の文字起こしテキストから、以下の構造で議事録をMarkdown形式で出力してください。

## 会議概要
（会議の目的・テーマを1-2文で）

## アジェンダ
- 議題1
- 議題2
...

## 議論の要点
### 議題ごとの要約

## 決定事項
- ✅ 決定事項1
- ✅ 決定事項2

## アクションアイテム
- [ ] 担当者: タスク内容（期限）

## 次のステップ
- 次回会議の予定やフォローアップ事項

注意:
- 簡潔かつ正確に
- 発言者が特定できる場合は名前を含める
- 不明な点は推測せず省略する
- 日本語で出力する";

const SUMMARY_PROMPT: &str = "\
あなたは会議内容を短くまとめる専門家です。
与えられた会議の文字起こしテキストから、以下の構造で要約をMarkdown形式で出力してください。

## 要約
（会議全体の要点を3文以内で）

## 重要なポイント
- ポイント1
- ポイント2

## 決定事項
- 決定事項1

注意:
- 箇条書きは5項目以内に絞る
- 不明な点は推測せず省略する
- 日本語で出力する";

const ONE_ON_ONE_PROMPT: &str = "\
あなたは1on1ミーティングの記録を作成する専門家です。
与えられた1on1の文字起こしテキストから、以下の構造で記録をMarkdown形式で出力してください。

## 参加者
- 上長
- メンバー

## 近況・コンディション
（メンバーの近況を1-2文で）

## 話し合ったトピック
### トピックごとの要約

## フィードバック
- 良かった点
- 改善点

## 次回までのアクション
- [ ] 担当者: タスク内容（期限）

注意:
- 個人の評価に関わる推測は書かない
- 発言者が特定できる場合は名前を含める
- 日本語で出力する";

/// The built-in templates, in display order.
pub fn presets() -> Vec<Template> {
    vec![
        Template::new(DEFAULT_TEMPLATE_ID, "議事録（標準）", MINUTES_PROMPT),
        Template::new("summary", "要約", SUMMARY_PROMPT),
        Template::new("one-on-one", "1on1", ONE_ON_ONE_PROMPT),
    ]
}
